//! Mutable Default Arguments Detector (Python)
//!
//! A mutable default is evaluated once at definition time and shared across
//! calls, so mutations leak between callers.

use crate::detectors::base::Detector;
use crate::detectors::python;
use crate::models::{Finding, Language, MetricCategory, Severity};
use crate::normalizer::SourceFile;
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

static MUTABLE_DEFAULT: OnceLock<Regex> = OnceLock::new();

fn mutable_default() -> &'static Regex {
    MUTABLE_DEFAULT.get_or_init(|| {
        Regex::new(r"^(\[|\{|(set|list|dict|defaultdict|Counter|deque|OrderedDict)\()")
            .expect("valid regex")
    })
}

/// Get the appropriate fix based on mutable type
fn get_fix_example(default: &str, param_name: &str) -> String {
    let fresh = if default.starts_with('[') || default.starts_with("list(") {
        "[]"
    } else if default.starts_with('{') || default.starts_with("dict(") {
        "{}"
    } else if default.starts_with("set(") {
        "set()"
    } else {
        "<default>"
    };
    format!(
        "Use `{param}=None` and start the body with `{param} = {param} if {param} is not None else {fresh}`",
        param = param_name,
        fresh = fresh
    )
}

pub struct MutableDefaultArgsDetector;

impl MutableDefaultArgsDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MutableDefaultArgsDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for MutableDefaultArgsDetector {
    fn name(&self) -> &'static str {
        "py-mutable-default-arg"
    }

    fn description(&self) -> &'static str {
        "Detects mutable default arguments in Python functions"
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::Accuracy
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self, language: &Language) -> bool {
        *language == Language::Python
    }

    fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>> {
        let mut findings = vec![];
        for func in python::functions(source) {
            for param in &func.params {
                let Some(default) = param.default.as_deref() else {
                    continue;
                };
                if !mutable_default().is_match(default) {
                    continue;
                }
                findings.push(
                    self.finding(
                        func.def_line,
                        format!(
                            "Parameter '{}' of '{}' has a mutable default argument that is shared between calls",
                            param.name, func.name
                        ),
                    )
                    .with_symbol(param.name.clone())
                    .with_suggestion(get_fix_example(default, &param.name)),
                );
            }
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_list_and_dict_defaults() {
        let code = "def f(a, b=[], c={}, d=None, e=set()):\n    pass\n";
        let src = SourceFile::new(code, Language::Python);
        let findings = MutableDefaultArgsDetector::new().inspect(&src).unwrap();
        let names: Vec<&str> = findings.iter().filter_map(|f| f.symbol.as_deref()).collect();
        assert_eq!(names, vec!["b", "c", "e"]);
        assert!(findings[0].suggested_fix.as_deref().unwrap().contains("b = b if b is not None else []"));
    }

    #[test]
    fn test_immutable_defaults_ok() {
        let code = "def f(a=1, b='x', c=(1, 2), d: int = 0):\n    pass\n";
        let src = SourceFile::new(code, Language::Python);
        assert!(MutableDefaultArgsDetector::new().inspect(&src).unwrap().is_empty());
    }
}
