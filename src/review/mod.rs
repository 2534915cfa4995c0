//! Review record building
//!
//! Packages the outputs of the earlier stages into the immutable
//! [`ReviewResult`] and its [`Review`] history wrapper. Nothing here
//! analyzes or scores: findings are only put into display order and
//! counted.

use crate::models::{
    Finding, FindingCounts, Language, Metrics, Review, ReviewResult, ReviewStats, ReviewType,
    Submission,
};
use crate::normalizer::StructuralStats;
use chrono::Utc;
use uuid::Uuid;

/// Assembles one [`Review`]
#[derive(Debug, Clone)]
pub struct ReviewBuilder {
    filename: String,
    language: Language,
    review_type: ReviewType,
    degraded: bool,
    notes: Vec<String>,
    failed_detectors: Vec<String>,
    findings: Vec<Finding>,
    metrics: Metrics,
    score: u8,
    summary: String,
    improved_code: String,
    stats: ReviewStats,
}

impl ReviewBuilder {
    pub fn new(submission: &Submission) -> Self {
        Self {
            filename: submission.filename(),
            language: submission.language().clone(),
            review_type: submission.review_type(),
            degraded: false,
            notes: Vec::new(),
            failed_detectors: Vec::new(),
            findings: Vec::new(),
            metrics: Metrics::perfect(),
            score: 100,
            summary: String::new(),
            improved_code: submission.source_text().to_string(),
            stats: ReviewStats::default(),
        }
    }

    pub fn degraded(mut self, degraded: bool) -> Self {
        self.degraded = degraded;
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn failed_detectors(mut self, names: Vec<String>) -> Self {
        self.failed_detectors = names;
        self
    }

    pub fn findings(mut self, findings: Vec<Finding>) -> Self {
        self.findings = findings;
        self
    }

    pub fn metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn score(mut self, score: u8, summary: impl Into<String>) -> Self {
        self.score = score;
        self.summary = summary.into();
        self
    }

    pub fn improved_code(mut self, code: impl Into<String>) -> Self {
        self.improved_code = code.into();
        self
    }

    pub fn structure(mut self, structure: StructuralStats) -> Self {
        self.stats.structure = structure;
        self
    }

    pub fn detector_counts(mut self, run: usize, failed: usize) -> Self {
        self.stats.detectors_run = run;
        self.stats.detectors_failed = failed;
        self
    }

    pub fn fix_counts(mut self, applied: usize, unresolved: usize) -> Self {
        self.stats.fixes_applied = applied;
        self.stats.fixes_unresolved = unresolved;
        self
    }

    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.stats.duration_ms = duration_ms;
        self
    }

    /// Stamp identity and time, and freeze the record
    pub fn build(mut self) -> Review {
        self.findings.sort_by(Finding::display_order);
        self.stats.counts = FindingCounts::from_findings(&self.findings);

        Review {
            id: Uuid::new_v4(),
            filename: self.filename,
            language: self.language,
            review_type: self.review_type,
            score: self.score,
            timestamp: Utc::now(),
            degraded: self.degraded,
            notes: self.notes,
            failed_detectors: self.failed_detectors,
            stats: self.stats,
            result: ReviewResult {
                score: self.score,
                summary: self.summary,
                metrics: self.metrics,
                findings: self.findings,
                improved_code: self.improved_code,
            },
        }
    }
}
