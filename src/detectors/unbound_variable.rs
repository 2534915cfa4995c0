//! Possibly-Unbound Variable Detector (Python)
//!
//! Reports reads of a name that is only assigned on some paths through a
//! preceding `if`/`for`/`while`/`try`/`with`/`match` statement.

use crate::detectors::base::Detector;
use crate::detectors::python;
use crate::models::{Finding, Language, MetricCategory, Severity};
use crate::normalizer::SourceFile;
use anyhow::Result;

pub struct UnboundVariableDetector;

impl UnboundVariableDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnboundVariableDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for UnboundVariableDetector {
    fn name(&self) -> &'static str {
        "py-unbound-variable"
    }

    fn description(&self) -> &'static str {
        "Detects variables that might be referenced before assignment"
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::Accuracy
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn applies_to(&self, language: &Language) -> bool {
        *language == Language::Python
    }

    fn auto_fixable(&self) -> bool {
        true
    }

    fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>> {
        Ok(python::unbound_reads(source)
            .into_iter()
            .map(|read| {
                self.finding(
                    read.line,
                    format!(
                        "Variable '{}' might be referenced before assignment.",
                        read.name
                    ),
                )
                .with_symbol(read.name)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_conditional_assignment() {
        let code = "def process(items):\n    if items:\n        result = len(items)\n    return result\n";
        let src = SourceFile::new(code, Language::Python);
        let findings = UnboundVariableDetector::new().inspect(&src).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 4);
        assert_eq!(
            findings[0].message,
            "Variable 'result' might be referenced before assignment."
        );
        assert_eq!(findings[0].symbol.as_deref(), Some("result"));
        assert_eq!(findings[0].kind, Severity::Error);
    }

    #[test]
    fn test_assigned_on_every_path() {
        let code = "if a:\n    r = 1\nelse:\n    r = 2\nprint(r)\n";
        let src = SourceFile::new(code, Language::Python);
        assert!(UnboundVariableDetector::new().inspect(&src).unwrap().is_empty());
    }
}
