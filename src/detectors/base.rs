//! Base detector trait and types
//!
//! This module defines the core abstractions for rule detection:
//! - `Detector` trait that all detectors must implement
//! - `DetectorResult` for capturing execution results
//! - `DetectionSummary` for run statistics

use crate::models::{DetectorClass, Finding, Language, MetricCategory, Severity};
use crate::normalizer::SourceFile;
use anyhow::Result;
use std::collections::HashMap;

/// Result from running a single detector
#[derive(Debug, Clone)]
pub struct DetectorResult {
    /// Rule ID of the detector that produced these results
    pub detector_name: String,
    /// Findings produced by the detector
    pub findings: Vec<Finding>,
    /// Execution time in milliseconds
    pub duration_ms: u64,
    /// Whether the detector completed successfully
    pub success: bool,
    /// Error message if the detector failed
    pub error: Option<String>,
}

impl DetectorResult {
    /// Create a successful result
    pub fn success(detector_name: String, findings: Vec<Finding>, duration_ms: u64) -> Self {
        Self {
            detector_name,
            findings,
            duration_ms,
            success: true,
            error: None,
        }
    }

    /// Create a failed result
    pub fn failure(detector_name: String, error: String, duration_ms: u64) -> Self {
        Self {
            detector_name,
            findings: Vec::new(),
            duration_ms,
            success: false,
            error: Some(error),
        }
    }
}

/// Trait for all rule detectors
///
/// A detector inspects one normalized submission for a single rule and
/// reports line-attributed findings. Detectors only read the source; they
/// never see other detectors' output.
///
/// # Example Implementation
///
/// ```ignore
/// pub struct MyDetector;
///
/// impl Detector for MyDetector {
///     fn name(&self) -> &'static str {
///         "my-rule"
///     }
///
///     fn description(&self) -> &'static str {
///         "Detects my specific issue"
///     }
///
///     fn category(&self) -> MetricCategory {
///         MetricCategory::Readability
///     }
///
///     fn severity(&self) -> Severity {
///         Severity::Suggestion
///     }
///
///     fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait Detector: Send + Sync {
    /// Stable rule identifier (e.g., "py-bare-except")
    fn name(&self) -> &'static str;

    /// Human-readable description of what this detector finds
    fn description(&self) -> &'static str;

    /// Class used to narrow a run by review type
    fn class(&self) -> DetectorClass {
        DetectorClass::Quality
    }

    /// Metric this detector's findings count against
    fn category(&self) -> MetricCategory;

    /// Severity of every finding this detector reports
    fn severity(&self) -> Severity;

    /// Multiplier on the severity penalty
    fn weight(&self) -> f64 {
        1.0
    }

    /// Whether this detector understands the given language
    fn applies_to(&self, _language: &Language) -> bool {
        true
    }

    /// Whether a patch is registered for this detector's rule
    fn auto_fixable(&self) -> bool {
        false
    }

    /// Run detection and return findings
    fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>>;

    /// Build a finding carrying this detector's rule metadata
    fn finding(&self, line: u32, message: impl Into<String>) -> Finding
    where
        Self: Sized,
    {
        Finding::new(self.name(), self.severity(), line, message, self.category())
            .with_weight(self.weight())
            .fixable(self.auto_fixable())
    }
}

/// Summary statistics from running all detectors
#[derive(Debug, Clone, Default)]
pub struct DetectionSummary {
    /// Total number of detectors run
    pub detectors_run: usize,
    /// Number of detectors that succeeded
    pub detectors_succeeded: usize,
    /// Number of detectors that failed
    pub detectors_failed: usize,
    /// Rule IDs of failed detectors, in registration order
    pub failed: Vec<String>,
    /// Total findings across all detectors
    pub total_findings: usize,
    /// Findings by severity
    pub by_severity: HashMap<Severity, usize>,
    /// Total execution time in milliseconds
    pub total_duration_ms: u64,
}

impl DetectionSummary {
    /// Update summary with a detector result
    pub fn add_result(&mut self, result: &DetectorResult) {
        self.detectors_run += 1;
        self.total_duration_ms += result.duration_ms;

        if result.success {
            self.detectors_succeeded += 1;
            self.total_findings += result.findings.len();

            for finding in &result.findings {
                *self.by_severity.entry(finding.kind).or_insert(0) += 1;
            }
        } else {
            self.detectors_failed += 1;
            self.failed.push(result.detector_name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_result_success() {
        let result = DetectorResult::success("long-line".to_string(), vec![], 100);
        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.duration_ms, 100);
    }

    #[test]
    fn test_detector_result_failure() {
        let result = DetectorResult::failure("long-line".to_string(), "oops".to_string(), 50);
        assert!(!result.success);
        assert_eq!(result.error, Some("oops".to_string()));
    }

    #[test]
    fn test_detection_summary() {
        let mut summary = DetectionSummary::default();

        let finding = Finding::new("d1", Severity::Warning, 1, "m", MetricCategory::Readability);
        let result1 = DetectorResult::success("d1".to_string(), vec![finding], 100);
        let result2 = DetectorResult::failure("d2".to_string(), "err".to_string(), 50);

        summary.add_result(&result1);
        summary.add_result(&result2);

        assert_eq!(summary.detectors_run, 2);
        assert_eq!(summary.detectors_succeeded, 1);
        assert_eq!(summary.detectors_failed, 1);
        assert_eq!(summary.failed, vec!["d2".to_string()]);
        assert_eq!(summary.by_severity.get(&Severity::Warning), Some(&1));
        assert_eq!(summary.total_duration_ms, 150);
    }
}
