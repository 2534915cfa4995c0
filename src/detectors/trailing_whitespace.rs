//! Trailing Whitespace Detector

use crate::detectors::base::Detector;
use crate::models::{Finding, MetricCategory, Severity};
use crate::normalizer::SourceFile;
use anyhow::Result;

pub struct TrailingWhitespaceDetector;

impl TrailingWhitespaceDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TrailingWhitespaceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for TrailingWhitespaceDetector {
    fn name(&self) -> &'static str {
        "trailing-whitespace"
    }

    fn description(&self) -> &'static str {
        "Detects spaces or tabs at the end of a line"
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::Readability
    }

    fn severity(&self) -> Severity {
        Severity::Suggestion
    }

    fn auto_fixable(&self) -> bool {
        true
    }

    fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>> {
        Ok(source
            .lines()
            .iter()
            .enumerate()
            .map(|(i, line)| (i as u32 + 1, line))
            // Whitespace before a terminator inside a string literal is content
            .filter(|(n, line)| line.ends_with([' ', '\t']) && !source.ends_in_string(*n))
            .map(|(n, _)| self.finding(n, "Trailing whitespace"))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;

    #[test]
    fn test_flags_trailing_spaces() {
        let src = SourceFile::new("x = 1  \ny = 2\n\t\n", Language::Python);
        let lines: Vec<u32> = TrailingWhitespaceDetector::new()
            .inspect(&src)
            .unwrap()
            .iter()
            .map(|f| f.line)
            .collect();
        assert_eq!(lines, vec![1, 3]);
    }

    #[test]
    fn test_string_content_is_kept() {
        let src = SourceFile::new("s = '''a  \nb'''\n", Language::Python);
        assert!(TrailingWhitespaceDetector::new().inspect(&src).unwrap().is_empty());
    }
}
