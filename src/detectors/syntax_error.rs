//! Syntax Error Detector
//!
//! Reports the places where the tree-sitter grammar for the submission's
//! language had to recover from invalid input.

use crate::detectors::base::Detector;
use crate::models::{DetectorClass, Finding, Language, MetricCategory, Severity};
use crate::normalizer::SourceFile;
use crate::parsers;
use anyhow::Result;

pub struct SyntaxErrorDetector;

impl SyntaxErrorDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SyntaxErrorDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for SyntaxErrorDetector {
    fn name(&self) -> &'static str {
        "syntax-error"
    }

    fn description(&self) -> &'static str {
        "Detects code the language grammar cannot parse"
    }

    fn class(&self) -> DetectorClass {
        DetectorClass::Syntax
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::Accuracy
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn applies_to(&self, language: &Language) -> bool {
        parsers::grammar(language).is_some()
    }

    fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>> {
        let issues = parsers::syntax_issues(source.text(), source.language())?;
        Ok(issues
            .iter()
            .map(|issue| self.finding(issue.line, issue.message()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_code_is_clean() {
        let src = SourceFile::new("def f(a):\n    return a\n", Language::Python);
        assert!(SyntaxErrorDetector::new().inspect(&src).unwrap().is_empty());
    }

    #[test]
    fn test_reports_broken_java() {
        let src = SourceFile::new(
            "class A {\n  void f() {\n    int x = ;\n  }\n}\n",
            Language::Java,
        );
        let findings = SyntaxErrorDetector::new().inspect(&src).unwrap();
        assert!(!findings.is_empty());
        assert!(findings.iter().all(|f| f.kind == Severity::Error));
        assert!(findings.iter().all(|f| f.rule_id == "syntax-error"));
    }

    #[test]
    fn test_unsupported_language_not_applicable() {
        assert!(!SyntaxErrorDetector::new().applies_to(&Language::parse("COBOL")));
        assert!(SyntaxErrorDetector::new().applies_to(&Language::Go));
    }
}
