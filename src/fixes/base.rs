//! Base patch trait and line edits

use crate::models::Finding;
use crate::normalizer::SourceFile;

/// A localized rewrite expressed against the pre-fix line snapshot.
///
/// `start..end` is a half-open range of 0-based line indexes. An empty range
/// is a pure insertion before line index `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEdit {
    pub start: usize,
    pub end: usize,
    pub replacement: Vec<String>,
}

impl LineEdit {
    /// Insert lines before the given 1-based line
    pub fn insert_before(line: u32, lines: Vec<String>) -> Self {
        let at = (line as usize).saturating_sub(1);
        Self {
            start: at,
            end: at,
            replacement: lines,
        }
    }

    /// Replace 1-based lines `first..=last`
    pub fn replace_lines(first: u32, last: u32, replacement: Vec<String>) -> Self {
        Self {
            start: (first as usize).saturating_sub(1),
            end: last as usize,
            replacement,
        }
    }

    /// Replace a single 1-based line
    pub fn replace_line(line: u32, text: impl Into<String>) -> Self {
        Self::replace_lines(line, line, vec![text.into()])
    }

    pub fn is_insertion(&self) -> bool {
        self.start == self.end
    }

    /// Whether two edits cannot both be applied to the same snapshot.
    /// Insertions only clash with a replacement that strictly surrounds
    /// their position.
    pub fn conflicts_with(&self, other: &LineEdit) -> bool {
        match (self.is_insertion(), other.is_insertion()) {
            (true, true) => false,
            (true, false) => other.start < self.start && self.start < other.end,
            (false, true) => self.start < other.start && other.start < self.end,
            (false, false) => self.start < other.end && other.start < self.end,
        }
    }

    /// 1-based inclusive line span, for messages
    pub fn span(&self) -> (usize, usize) {
        (self.start + 1, self.end.max(self.start + 1))
    }
}

/// A mechanical rewrite registered for one rule.
///
/// Patches never touch the source directly: they describe an edit against
/// the snapshot and the synthesizer decides whether it is applied.
pub trait Patch: Send + Sync {
    /// Rule ID whose findings this patch resolves
    fn rule_id(&self) -> &'static str;

    /// Edit resolving `finding`, or `None` when the finding's construct
    /// cannot be rewritten safely
    fn patch(&self, source: &SourceFile, finding: &Finding) -> Option<LineEdit>;
}

/// Insert `text` at each char offset of `line`. Offsets refer to the
/// original line and may come in any order.
pub(crate) fn insert_at_chars(line: &str, inserts: &[(usize, &str)]) -> Option<String> {
    let char_count = line.chars().count();
    let mut sorted: Vec<(usize, &str)> = inserts.to_vec();
    sorted.sort_by(|a, b| b.0.cmp(&a.0));

    let mut out = line.to_string();
    for (offset, text) in sorted {
        if offset > char_count {
            return None;
        }
        let byte = line
            .char_indices()
            .nth(offset)
            .map(|(b, _)| b)
            .unwrap_or(line.len());
        out.insert_str(byte, text);
    }
    Some(out)
}
