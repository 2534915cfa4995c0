//! Structural statistics
//!
//! Computed once per submission and shared by the structural detectors and
//! the metric aggregator.

use super::LineInfo;
use serde::{Deserialize, Serialize};

/// Default long-line limit when no configuration is supplied
pub const DEFAULT_LINE_LIMIT: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralStats {
    pub line_count: usize,
    pub non_blank_lines: usize,
    /// Average length in characters over non-blank lines
    pub avg_line_length: f64,
    pub max_line_length: usize,
    /// Lines longer than the configured limit
    pub long_lines: usize,
    pub max_nesting: u32,
    /// Nesting depth per line (index 0 is line 1); blank and comment-only
    /// lines are 0
    #[serde(default, skip_serializing)]
    pub nesting_profile: Vec<u32>,
    pub comment_lines: usize,
    /// `comment_lines / non_blank_lines`
    pub comment_ratio: f64,
}

/// Width in columns of a line's leading whitespace, with tabs advancing to
/// the next multiple of `tab_width`.
pub fn indent_width(line: &str, tab_width: usize) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width = (width / tab_width + 1) * tab_width,
            _ => break,
        }
    }
    width
}

/// Nesting from indentation levels. Lines that continue an open bracket or
/// a multi-line string inherit the depth of the statement they belong to.
pub(crate) fn indentation_profile(lines: &[String], infos: &[LineInfo], tab_width: usize) -> Vec<u32> {
    let is_statement = |i: usize| {
        infos[i].has_code
            && !infos[i].starts_in_string
            && infos[i].bracket_depth == 0
            && !lines[i].trim().is_empty()
    };

    let unit = (0..lines.len())
        .filter(|&i| is_statement(i))
        .map(|i| indent_width(&lines[i], tab_width))
        .filter(|w| *w > 0)
        .min()
        .unwrap_or(4);

    let mut last = 0u32;
    (0..lines.len())
        .map(|i| {
            if !infos[i].has_code || lines[i].trim().is_empty() {
                0
            } else if is_statement(i) {
                last = (indent_width(&lines[i], tab_width) / unit) as u32;
                last
            } else {
                last
            }
        })
        .collect()
}

/// Nesting from brace depth; a line opening with `}` belongs to the outer
/// level.
pub(crate) fn brace_profile(lines: &[String], infos: &[LineInfo]) -> Vec<u32> {
    (0..lines.len())
        .map(|i| {
            let info = &infos[i];
            if !info.has_code || lines[i].trim().is_empty() {
                0
            } else if info.opens_with_close_brace {
                info.brace_depth.saturating_sub(1)
            } else {
                info.brace_depth
            }
        })
        .collect()
}

pub(crate) fn compute(
    lines: &[String],
    infos: &[LineInfo],
    nesting_profile: Vec<u32>,
    max_line_length: usize,
) -> StructuralStats {
    let lengths: Vec<usize> = lines.iter().map(|l| l.chars().count()).collect();
    let non_blank: Vec<usize> = lines
        .iter()
        .zip(&lengths)
        .filter(|(l, _)| !l.trim().is_empty())
        .map(|(_, len)| *len)
        .collect();

    let avg_line_length = if non_blank.is_empty() {
        0.0
    } else {
        non_blank.iter().sum::<usize>() as f64 / non_blank.len() as f64
    };

    let comment_lines = infos.iter().filter(|i| i.has_comment).count();
    let comment_ratio = if non_blank.is_empty() {
        0.0
    } else {
        comment_lines as f64 / non_blank.len() as f64
    };

    StructuralStats {
        line_count: lines.len(),
        non_blank_lines: non_blank.len(),
        avg_line_length,
        max_line_length: lengths.iter().copied().max().unwrap_or(0),
        long_lines: lengths.iter().filter(|len| **len > max_line_length).count(),
        max_nesting: nesting_profile.iter().copied().max().unwrap_or(0),
        nesting_profile,
        comment_lines,
        comment_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_width() {
        assert_eq!(indent_width("    x", 8), 4);
        assert_eq!(indent_width("\tx", 8), 8);
        assert_eq!(indent_width("  \tx", 8), 8);
        assert_eq!(indent_width("\t  x", 4), 6);
        assert_eq!(indent_width("x", 8), 0);
    }
}
