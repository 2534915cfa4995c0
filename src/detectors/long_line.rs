//! Long Line Detector

use crate::detectors::base::Detector;
use crate::models::{Finding, MetricCategory, Severity};
use crate::normalizer::{SourceFile, DEFAULT_LINE_LIMIT};
use anyhow::Result;

pub struct LongLineDetector {
    max_line_length: usize,
}

impl LongLineDetector {
    pub fn new(max_line_length: usize) -> Self {
        Self { max_line_length }
    }
}

impl Default for LongLineDetector {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_LIMIT)
    }
}

impl Detector for LongLineDetector {
    fn name(&self) -> &'static str {
        "long-line"
    }

    fn description(&self) -> &'static str {
        "Detects lines longer than the configured limit"
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::Readability
    }

    fn severity(&self) -> Severity {
        Severity::Suggestion
    }

    fn weight(&self) -> f64 {
        0.5
    }

    fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for (i, line) in source.lines().iter().enumerate() {
            let len = line.chars().count();
            if len > self.max_line_length {
                findings.push(self.finding(
                    i as u32 + 1,
                    format!(
                        "Line is {} characters long (limit {})",
                        len, self.max_line_length
                    ),
                ));
            }
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;

    #[test]
    fn test_limit_is_exclusive() {
        let code = format!("{}\n{}\n", "a".repeat(10), "b".repeat(11));
        let src = SourceFile::new(&code, Language::Python);
        let findings = LongLineDetector::new(10).inspect(&src).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 2);
        assert_eq!(findings[0].weight, 0.5);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let src = SourceFile::new("ééééé\n", Language::Python);
        assert!(LongLineDetector::new(5).inspect(&src).unwrap().is_empty());
    }
}
