//! Detector execution engine with parallel support
//!
//! The DetectorEngine orchestrates the execution of all selected detectors
//! against one normalized submission:
//! - Runs detectors in parallel on a bounded rayon pool
//! - Waits for results over a channel with a hard deadline
//! - Isolates detector errors and panics
//! - Post-processes the merged findings
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    DetectorEngine                       │
//! ├─────────────────────────────────────────────────────────┤
//! │  1. Register detectors                                  │
//! │  2. Spawn one job per detector on the pool              │
//! │  3. Collect results until done or deadline              │
//! │  4. Merge in registration order                         │
//! │  5. Suppress, clamp, dedupe, sort, truncate             │
//! └─────────────────────────────────────────────────────────┘
//! ```

use crate::cancel::CancellationToken;
use crate::detectors::base::{DetectionSummary, Detector, DetectorResult};
use crate::error::{Result, ReviewError};
use crate::models::Finding;
use crate::normalizer::SourceFile;
use crossbeam_channel::RecvTimeoutError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Maximum findings to keep to prevent memory exhaustion
const MAX_FINDINGS_LIMIT: usize = 10_000;

/// Comment marker that silences findings on its line or the next one
pub const SUPPRESS_MARKER: &str = "critique: ignore";
const SUPPRESS_MARKER_ALT: &str = "critique:ignore";

/// Merged output of one engine run
#[derive(Debug, Clone, Default)]
pub struct EngineRun {
    /// Post-processed findings in display order
    pub findings: Vec<Finding>,
    pub summary: DetectionSummary,
}

/// Orchestrates rule detection across all registered detectors
pub struct DetectorEngine {
    /// Registered detectors
    detectors: Vec<Arc<dyn Detector>>,
    /// Number of worker threads for parallel execution
    workers: usize,
    /// Maximum findings to return
    max_findings: usize,
}

impl DetectorEngine {
    /// Create a new detector engine
    ///
    /// # Arguments
    /// * `workers` - Number of worker threads (0 = auto-detect)
    pub fn new(workers: usize) -> Self {
        let actual_workers = if workers == 0 {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
                .min(16) // Cap at 16 threads
        } else {
            workers
        };

        Self {
            detectors: Vec::new(),
            workers: actual_workers,
            max_findings: MAX_FINDINGS_LIMIT,
        }
    }

    /// Set the maximum number of findings to return
    pub fn with_max_findings(mut self, max: usize) -> Self {
        self.max_findings = max;
        self
    }

    /// Register a detector
    pub fn register(&mut self, detector: Arc<dyn Detector>) {
        debug!("Registering detector: {}", detector.name());
        self.detectors.push(detector);
    }

    /// Register multiple detectors at once
    pub fn register_all(&mut self, detectors: impl IntoIterator<Item = Arc<dyn Detector>>) {
        for detector in detectors {
            self.register(detector);
        }
    }

    /// Get the number of registered detectors
    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }

    /// Get names of all registered detectors
    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Run all detectors and collect findings
    ///
    /// Returns `Timeout` if `deadline` passes before every detector has
    /// reported, carrying the findings of the detectors that did finish.
    /// Detectors still running at that point are left to finish on the
    /// pool; those not yet started are skipped.
    pub fn run(
        &self,
        source: Arc<SourceFile>,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<EngineRun> {
        let start = Instant::now();
        info!(
            "Starting detection with {} detectors on {} workers",
            self.detectors.len(),
            self.workers
        );

        if self.detectors.is_empty() {
            return Ok(EngineRun::default());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("critique-detector-{}", i))
            .build()?;

        let (tx, rx) = crossbeam_channel::unbounded::<(usize, Option<DetectorResult>)>();
        let abort = CancellationToken::new();

        for (index, detector) in self.detectors.iter().enumerate() {
            let detector = Arc::clone(detector);
            let source = Arc::clone(&source);
            let tx = tx.clone();
            let cancel = cancel.clone();
            let abort = abort.clone();
            pool.spawn(move || {
                let result = if cancel.is_cancelled() || abort.is_cancelled() {
                    debug!("Skipping detector {}: run stopped", detector.name());
                    None
                } else {
                    Some(run_single_detector(detector.as_ref(), &source))
                };
                // The receiver is gone once the run has timed out
                let _ = tx.send((index, result));
            });
        }
        drop(tx);

        let total = self.detectors.len();
        let mut slots: Vec<Option<DetectorResult>> = (0..total).map(|_| None).collect();
        let mut received = 0;
        while received < total {
            match rx.recv_deadline(deadline) {
                Ok((index, result)) => {
                    slots[index] = result;
                    received += 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    abort.cancel();
                    let elapsed_ms = start.elapsed().as_millis() as u64;
                    let partial: Vec<Finding> = slots
                        .into_iter()
                        .flatten()
                        .filter(|r| r.success)
                        .flat_map(|r| r.findings)
                        .collect();
                    warn!(
                        "Detection timed out after {}ms with {}/{} detectors complete",
                        elapsed_ms, received, total
                    );
                    return Err(ReviewError::Timeout {
                        elapsed_ms,
                        partial_findings: self.finalize(&source, partial),
                    });
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        if cancel.is_cancelled() {
            info!("Detection cancelled");
            return Err(ReviewError::Cancelled);
        }

        let mut all_findings = Vec::new();
        let mut summary = DetectionSummary::default();
        for result in slots.into_iter().flatten() {
            summary.add_result(&result);
            if result.success {
                all_findings.extend(result.findings);
            } else if let Some(err) = &result.error {
                warn!("Detector {} failed: {}", result.detector_name, err);
            }
        }

        let findings = self.finalize(&source, all_findings);

        info!(
            "Detection complete: {} findings from {}/{} detectors in {:?}",
            findings.len(),
            summary.detectors_succeeded,
            summary.detectors_run,
            start.elapsed()
        );

        Ok(EngineRun { findings, summary })
    }

    /// Suppress, clamp, dedupe, order and cap merged findings
    fn finalize(&self, source: &SourceFile, findings: Vec<Finding>) -> Vec<Finding> {
        let before = findings.len();
        let mut findings: Vec<Finding> = findings
            .into_iter()
            .filter(|f| !is_suppressed(source, f.line))
            .map(|f| {
                let line = source.clamp_line(f.line);
                let mut f = if line != f.line { f.at_line(line) } else { f };
                if let Some(end) = f.line_end {
                    f.line_end = Some(source.clamp_line(end).max(f.line));
                }
                f
            })
            .collect();

        let suppressed = before - findings.len();
        if suppressed > 0 {
            debug!("Suppressed {} findings via `{}`", suppressed, SUPPRESS_MARKER);
        }

        // Higher severity sorts first within a line, so the first (rule, line)
        // occurrence is the one kept
        findings.sort_by(Finding::display_order);
        let mut seen = HashSet::new();
        findings.retain(|f| seen.insert((f.rule_id.clone(), f.line)));

        if findings.len() > self.max_findings {
            warn!(
                "Truncating findings from {} to {} (max limit)",
                findings.len(),
                self.max_findings
            );
            findings.truncate(self.max_findings);
        }

        findings
    }
}

impl Default for DetectorEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Whether line `n` carries a suppression comment or follows a comment-only
/// line that does
pub fn is_suppressed(source: &SourceFile, n: u32) -> bool {
    let marked = |n: u32| {
        source.line(n).is_some_and(|l| {
            let lower = l.to_lowercase();
            lower.contains(SUPPRESS_MARKER) || lower.contains(SUPPRESS_MARKER_ALT)
        }) && (source.degraded() || source.has_comment(n))
    };
    let standalone = |n: u32| source.degraded() || source.is_comment_only(n);

    marked(n) || (n > 1 && marked(n - 1) && standalone(n - 1))
}

/// Run a single detector with error handling and timing
fn run_single_detector(detector: &dyn Detector, source: &SourceFile) -> DetectorResult {
    let name = detector.name().to_string();
    let start = Instant::now();

    debug!("Running detector: {}", name);

    // Wrap in catch_unwind to handle panics
    let detect_result =
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| detector.inspect(source)));

    let duration = start.elapsed().as_millis() as u64;
    match detect_result {
        Ok(Ok(findings)) => {
            debug!(
                "Detector {} found {} findings in {}ms",
                name,
                findings.len(),
                duration
            );
            DetectorResult::success(name, findings, duration)
        }
        Ok(Err(e)) => {
            warn!("Detector {} failed: {}", name, e);
            DetectorResult::failure(name, e.to_string(), duration)
        }
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            error!("Detector {} panicked: {}", name, panic_msg);
            DetectorResult::failure(name, format!("Panic: {}", panic_msg), duration)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Language, MetricCategory, Severity};
    use std::time::Duration;

    enum Behavior {
        Report(Vec<u32>),
        Fail,
        Panic,
        Sleep(Duration),
    }

    // Mock detector for testing
    struct MockDetector {
        name: &'static str,
        severity: Severity,
        behavior: Behavior,
    }

    impl MockDetector {
        fn reporting(name: &'static str, lines: Vec<u32>) -> Arc<dyn Detector> {
            Arc::new(Self {
                name,
                severity: Severity::Warning,
                behavior: Behavior::Report(lines),
            })
        }

        fn with(name: &'static str, behavior: Behavior) -> Arc<dyn Detector> {
            Arc::new(Self {
                name,
                severity: Severity::Warning,
                behavior,
            })
        }
    }

    impl Detector for MockDetector {
        fn name(&self) -> &'static str {
            self.name
        }

        fn description(&self) -> &'static str {
            "Mock detector for testing"
        }

        fn category(&self) -> MetricCategory {
            MetricCategory::Readability
        }

        fn severity(&self) -> Severity {
            self.severity
        }

        fn inspect(&self, _source: &SourceFile) -> anyhow::Result<Vec<Finding>> {
            match &self.behavior {
                Behavior::Report(lines) => Ok(lines
                    .iter()
                    .map(|l| self.finding(*l, format!("issue at {}", l)))
                    .collect()),
                Behavior::Fail => anyhow::bail!("could not analyze"),
                Behavior::Panic => panic!("detector blew up"),
                Behavior::Sleep(d) => {
                    std::thread::sleep(*d);
                    Ok(vec![])
                }
            }
        }
    }

    fn source(text: &str) -> Arc<SourceFile> {
        Arc::new(SourceFile::new(text, Language::Python))
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(30)
    }

    #[test]
    fn test_engine_creation() {
        let engine = DetectorEngine::new(4);
        assert_eq!(engine.workers, 4);
        assert_eq!(engine.detector_count(), 0);
    }

    #[test]
    fn test_engine_default_workers() {
        let engine = DetectorEngine::new(0);
        assert!(engine.workers > 0);
        assert!(engine.workers <= 16);
    }

    #[test]
    fn test_register_detectors() {
        let mut engine = DetectorEngine::new(2);
        engine.register(MockDetector::reporting("d1", vec![1]));
        engine.register(MockDetector::reporting("d2", vec![]));
        assert_eq!(engine.detector_count(), 2);
        assert_eq!(engine.detector_names(), vec!["d1", "d2"]);
    }

    #[test]
    fn test_merges_in_display_order() {
        let mut engine = DetectorEngine::new(4);
        engine.register_all([
            MockDetector::reporting("b", vec![3, 1]),
            MockDetector::reporting("a", vec![2]),
        ]);
        let run = engine
            .run(source("x = 1\ny = 2\nz = 3\n"), far_deadline(), &CancellationToken::new())
            .unwrap();
        let lines: Vec<u32> = run.findings.iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
        assert_eq!(run.summary.detectors_run, 2);
    }

    #[test]
    fn test_failures_and_panics_are_isolated() {
        let mut engine = DetectorEngine::new(2);
        engine.register_all([
            MockDetector::with("failing", Behavior::Fail),
            MockDetector::with("panicking", Behavior::Panic),
            MockDetector::reporting("ok", vec![1]),
        ]);
        let run = engine
            .run(source("x = 1\n"), far_deadline(), &CancellationToken::new())
            .unwrap();
        assert_eq!(run.findings.len(), 1);
        assert_eq!(run.summary.detectors_failed, 2);
        assert_eq!(
            run.summary.failed,
            vec!["failing".to_string(), "panicking".to_string()]
        );
    }

    #[test]
    fn test_out_of_range_lines_are_clamped() {
        let mut engine = DetectorEngine::new(1);
        engine.register(MockDetector::reporting("far", vec![0, 99]));
        let run = engine
            .run(source("a = 1\nb = 2\n"), far_deadline(), &CancellationToken::new())
            .unwrap();
        let lines: Vec<u32> = run.findings.iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![1, 2]);
    }

    #[test]
    fn test_duplicate_rule_line_pairs_collapse() {
        let mut engine = DetectorEngine::new(1);
        engine.register(MockDetector::reporting("dup", vec![1, 1, 1]));
        let run = engine
            .run(source("x = 1\n"), far_deadline(), &CancellationToken::new())
            .unwrap();
        assert_eq!(run.findings.len(), 1);
    }

    #[test]
    fn test_suppression_comments() {
        let src = source("a = 1  # critique: ignore\n# critique: ignore\nb = 2\nc = 3\n");
        let mut engine = DetectorEngine::new(1);
        engine.register(MockDetector::reporting("any", vec![1, 3, 4]));
        let run = engine
            .run(src, far_deadline(), &CancellationToken::new())
            .unwrap();
        let lines: Vec<u32> = run.findings.iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![4]);
    }

    #[test]
    fn test_marker_inside_string_does_not_suppress() {
        let src = source("s = 'critique: ignore'\n");
        assert!(!is_suppressed(&src, 1));
    }

    #[test]
    fn test_truncates_to_max_findings() {
        let mut engine = DetectorEngine::new(1).with_max_findings(2);
        engine.register(MockDetector::reporting("many", vec![1, 2, 3]));
        let run = engine
            .run(source("a\nb\nc\n"), far_deadline(), &CancellationToken::new())
            .unwrap();
        assert_eq!(run.findings.len(), 2);
    }

    #[test]
    fn test_deadline_returns_timeout() {
        let mut engine = DetectorEngine::new(2);
        engine.register(MockDetector::with("slow", Behavior::Sleep(Duration::from_secs(3))));
        let started = Instant::now();
        let err = engine
            .run(
                source("x = 1\n"),
                Instant::now() + Duration::from_millis(50),
                &CancellationToken::new(),
            )
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_cancelled_before_start() {
        let mut engine = DetectorEngine::new(1);
        engine.register(MockDetector::reporting("d", vec![1]));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = engine.run(source("x\n"), far_deadline(), &cancel).unwrap_err();
        assert!(matches!(err, ReviewError::Cancelled));
    }
}
