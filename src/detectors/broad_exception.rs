//! Bare Except Detector (Python)
//!
//! `except:` with no exception type also swallows `KeyboardInterrupt` and
//! `SystemExit`.

use crate::detectors::base::Detector;
use crate::models::{Finding, Language, MetricCategory, Severity};
use crate::normalizer::SourceFile;
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

static BARE_EXCEPT: OnceLock<Regex> = OnceLock::new();

fn bare_except() -> &'static Regex {
    BARE_EXCEPT.get_or_init(|| Regex::new(r"^\s*except\s*:").expect("valid regex"))
}

pub struct BareExceptDetector;

impl BareExceptDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BareExceptDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for BareExceptDetector {
    fn name(&self) -> &'static str {
        "py-bare-except"
    }

    fn description(&self) -> &'static str {
        "Detects bare except clauses"
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::BestPractices
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self, language: &Language) -> bool {
        *language == Language::Python
    }

    fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>> {
        Ok(source
            .code_lines()
            .filter(|(_, code)| bare_except().is_match(code))
            .map(|(n, _)| {
                self.finding(
                    n,
                    "Bare 'except:' catches every exception, including KeyboardInterrupt; catch a specific exception type",
                )
                .with_suggestion("except Exception:")
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_bare_except() {
        let code = "try:\n    run()\nexcept:\n    pass\n";
        let src = SourceFile::new(code, Language::Python);
        let findings = BareExceptDetector::new().inspect(&src).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 3);
    }

    #[test]
    fn test_typed_except_ok() {
        let code = "try:\n    run()\nexcept ValueError:\n    pass\ns = 'except:'\n";
        let src = SourceFile::new(code, Language::Python);
        assert!(BareExceptDetector::new().inspect(&src).unwrap().is_empty());
    }
}
