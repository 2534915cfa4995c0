//! Whitespace patches: tab expansion and trailing whitespace removal

use crate::fixes::base::{LineEdit, Patch};
use crate::models::Finding;
use crate::normalizer::{indent_width, SourceFile};

fn strip_trailing(line: &str) -> &str {
    line.trim_end_matches([' ', '\t'])
}

/// Expands leading tabs on the language's tab stops.
///
/// The rest of the line is kept byte for byte, so a trailing whitespace
/// finding on the same line stays visible after this fix.
pub struct ExpandTabsPatch;

impl Patch for ExpandTabsPatch {
    fn rule_id(&self) -> &'static str {
        "tab-indentation"
    }

    fn patch(&self, source: &SourceFile, finding: &Finding) -> Option<LineEdit> {
        let n = finding.line;
        if source.starts_in_string(n) {
            return None;
        }
        let line = source.line(n)?;
        let rest = line.trim_start_matches([' ', '\t']);
        let width = indent_width(line, source.tab_width());
        // Only the indent changes; trailing whitespace has its own rule
        Some(LineEdit::replace_line(n, format!("{}{}", " ".repeat(width), rest)))
    }
}

/// Strips trailing spaces and tabs
pub struct TrimTrailingPatch;

impl Patch for TrimTrailingPatch {
    fn rule_id(&self) -> &'static str {
        "trailing-whitespace"
    }

    fn patch(&self, source: &SourceFile, finding: &Finding) -> Option<LineEdit> {
        let n = finding.line;
        if source.ends_in_string(n) {
            return None;
        }
        let line = source.line(n)?;
        let trimmed = strip_trailing(line);
        if trimmed.len() == line.len() {
            return None;
        }
        Some(LineEdit::replace_line(n, trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Language, MetricCategory, Severity};

    fn finding(rule: &str, line: u32) -> Finding {
        Finding::new(rule, Severity::Warning, line, "m", MetricCategory::Readability)
    }

    #[test]
    fn test_python_tabs_expand_to_eight() {
        let src = SourceFile::new("if x:\n\ty = 1  \n", Language::Python);
        let edit = ExpandTabsPatch.patch(&src, &finding("tab-indentation", 2)).unwrap();
        assert_eq!(edit.replacement, vec!["        y = 1  ".to_string()]);
    }

    #[test]
    fn test_tab_expansion_keeps_trailing_whitespace() {
        let src = SourceFile::new("{\n\tx(); \t\n}\n", Language::JavaScript);
        let edit = ExpandTabsPatch.patch(&src, &finding("tab-indentation", 2)).unwrap();
        assert_eq!(edit.replacement, vec!["    x(); \t".to_string()]);
    }

    #[test]
    fn test_mixed_indent_uses_tab_stops() {
        let src = SourceFile::new("{\n  \tx();\n}\n", Language::JavaScript);
        let edit = ExpandTabsPatch.patch(&src, &finding("tab-indentation", 2)).unwrap();
        assert_eq!(edit.replacement, vec!["    x();".to_string()]);
    }

    #[test]
    fn test_trim_trailing() {
        let src = SourceFile::new("x = 1 \t\ny = 2\n", Language::Python);
        let edit = TrimTrailingPatch.patch(&src, &finding("trailing-whitespace", 1)).unwrap();
        assert_eq!(edit, LineEdit::replace_line(1, "x = 1"));
        assert!(TrimTrailingPatch.patch(&src, &finding("trailing-whitespace", 2)).is_none());
    }

    #[test]
    fn test_trailing_inside_string_is_left_alone() {
        let src = SourceFile::new("s = \"\"\"a   \nb\"\"\"\n", Language::Python);
        assert!(TrimTrailingPatch.patch(&src, &finding("trailing-whitespace", 1)).is_none());
    }
}
