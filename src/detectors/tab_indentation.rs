//! Tab Indentation Detector
//!
//! Flags lines whose leading whitespace contains a tab. Go is exempt since
//! gofmt indents with tabs.

use crate::detectors::base::Detector;
use crate::models::{DetectorClass, Finding, Language, MetricCategory, Severity};
use crate::normalizer::SourceFile;
use anyhow::Result;

pub struct TabIndentationDetector;

impl TabIndentationDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TabIndentationDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for TabIndentationDetector {
    fn name(&self) -> &'static str {
        "tab-indentation"
    }

    fn description(&self) -> &'static str {
        "Detects indentation that uses tab characters"
    }

    fn class(&self) -> DetectorClass {
        DetectorClass::Syntax
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::Readability
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self, language: &Language) -> bool {
        *language != Language::Go
    }

    fn auto_fixable(&self) -> bool {
        true
    }

    fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for (i, line) in source.lines().iter().enumerate() {
            let n = i as u32 + 1;
            if source.starts_in_string(n) || line.trim().is_empty() {
                continue;
            }
            let leading = &line[..line.len() - line.trim_start().len()];
            if leading.contains('\t') {
                findings.push(self.finding(n, "Indentation uses tabs; use spaces consistently"));
            }
        }
        Ok(findings)
    }
}
