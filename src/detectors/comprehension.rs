//! Prefer Comprehension Detector (Python)
//!
//! Finds `x = []` followed by a `for` loop whose only effect is appending
//! to `x`, optionally behind a single `if`.

use crate::detectors::base::Detector;
use crate::detectors::python;
use crate::models::{Finding, Language, MetricCategory, Severity};
use crate::normalizer::{SourceFile, DEFAULT_LINE_LIMIT};
use anyhow::Result;

pub struct PreferComprehensionDetector {
    /// Rewrites longer than this are reported but not auto-fixed
    max_line_length: usize,
}

impl PreferComprehensionDetector {
    pub fn new(max_line_length: usize) -> Self {
        Self { max_line_length }
    }
}

impl Default for PreferComprehensionDetector {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_LIMIT)
    }
}

impl Detector for PreferComprehensionDetector {
    fn name(&self) -> &'static str {
        "py-prefer-comprehension"
    }

    fn description(&self) -> &'static str {
        "Detects append loops that can be written as a list comprehension"
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::Performance
    }

    fn severity(&self) -> Severity {
        Severity::Suggestion
    }

    fn applies_to(&self, language: &Language) -> bool {
        *language == Language::Python
    }

    fn auto_fixable(&self) -> bool {
        true
    }

    fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>> {
        Ok(python::append_loops(source)
            .into_iter()
            .map(|lp| {
                let fits = lp.rewrite.chars().count() <= self.max_line_length;
                self.finding(
                    lp.for_line,
                    "Loop can be replaced with list comprehension for better readability.",
                )
                .with_line_end(lp.end_line)
                .with_symbol(lp.list)
                .with_suggestion(lp.rewrite.trim_start())
                .fixable(fits)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOOP: &str = "def f(items):\n    results = []\n    for item in items:\n        if item % 2 == 0:\n            results.append(item * 2)\n    return results\n";

    #[test]
    fn test_reports_append_loop() {
        let src = SourceFile::new(LOOP, Language::Python);
        let findings = PreferComprehensionDetector::default().inspect(&src).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 3);
        assert_eq!(findings[0].line_end, Some(5));
        assert_eq!(
            findings[0].suggested_fix.as_deref(),
            Some("results = [item * 2 for item in items if item % 2 == 0]")
        );
        assert!(findings[0].auto_fixable);
    }

    #[test]
    fn test_long_rewrite_not_fixable() {
        let src = SourceFile::new(LOOP, Language::Python);
        let findings = PreferComprehensionDetector::new(20).inspect(&src).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(!findings[0].auto_fixable);
    }
}
