//! Missing Type Hints Detector (Python)
//!
//! Flags non-trivial functions with unannotated parameters or no return
//! annotation. Functions whose body is shorter than the configured minimum
//! are left alone.

use crate::detectors::base::Detector;
use crate::detectors::python::{self, PyFunction};
use crate::models::{Finding, Language, MetricCategory, Severity};
use crate::normalizer::SourceFile;
use anyhow::Result;

pub struct MissingTypeHintsDetector {
    min_function_lines: usize,
}

impl MissingTypeHintsDetector {
    pub fn new(min_function_lines: usize) -> Self {
        Self { min_function_lines }
    }

    fn message(func: &PyFunction) -> Option<String> {
        let params: Vec<&str> = func.unannotated_params().map(|p| p.name.as_str()).collect();
        let message = match (params.is_empty(), func.has_return_annotation) {
            (true, true) => return None,
            (false, true) => format!(
                "Consider adding type hints to function parameters of '{}' ({}).",
                func.name,
                params.join(", ")
            ),
            (false, false) => format!(
                "Consider adding type hints to function parameters of '{}' ({}) and a return type.",
                func.name,
                params.join(", ")
            ),
            (true, false) => format!("Consider adding a return type hint to '{}'.", func.name),
        };
        Some(message)
    }
}

impl Default for MissingTypeHintsDetector {
    fn default() -> Self {
        Self::new(4)
    }
}

impl Detector for MissingTypeHintsDetector {
    fn name(&self) -> &'static str {
        "py-missing-type-hints"
    }

    fn description(&self) -> &'static str {
        "Detects functions without parameter or return type hints"
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::BestPractices
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
        Ok(python::functions(source)
            .iter()
            .filter(|f| f.body_lines() >= self.min_function_lines)
            .filter_map(|f| {
                let message = Self::message(f)?;
                Some(
                    self.finding(f.def_line, message)
                        .with_symbol(f.name.clone())
                        // Only single-line signatures are rewritten
                        .fixable(f.single_line_header()),
                )
            })
            .collect())
    }
}
