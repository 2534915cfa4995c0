//! Review pipeline
//!
//! Orchestrates one review:
//! 1. Validate configuration and reject oversized payloads
//! 2. Normalize the source
//! 3. Run the selected detectors under the time budget
//! 4. Synthesize fixes for auto-fixable findings
//! 5. Aggregate metrics and compose the score
//! 6. Build the review record

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::config::ReviewConfig;
use crate::detectors::{select_detectors, DetectorEngine};
use crate::error::{Result, ReviewError};
use crate::fixes::FixSynthesizer;
use crate::metrics::MetricAggregator;
use crate::models::{Metrics, Review, Submission};
use crate::normalizer::SourceFile;
use crate::review::ReviewBuilder;
use crate::scoring::ScoreComposer;

/// Review a submission with the given configuration
pub fn run_review(submission: &Submission, config: &ReviewConfig) -> Result<Review> {
    run_review_with_cancel(submission, config, &CancellationToken::new())
}

/// Review a submission, giving up early once `cancel` is set
pub fn run_review_with_cancel(
    submission: &Submission,
    config: &ReviewConfig,
    cancel: &CancellationToken,
) -> Result<Review> {
    ReviewPipeline::new(config.clone())?.run(submission, cancel)
}

/// A validated configuration ready to review submissions.
///
/// Holds no state between runs.
pub struct ReviewPipeline {
    config: ReviewConfig,
}

impl ReviewPipeline {
    /// Validate `config` and build a pipeline around it
    pub fn new(mut config: ReviewConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Run the full review pipeline
    pub fn run(&self, submission: &Submission, cancel: &CancellationToken) -> Result<Review> {
        let start = Instant::now();
        let deadline = start + Duration::from_millis(self.config.timeout_ms);
        let config = &self.config;

        let text = submission.source_text();
        if text.len() > config.max_payload_bytes {
            return Err(ReviewError::PayloadTooLarge {
                size: text.len(),
                limit: config.max_payload_bytes,
            });
        }
        if cancel.is_cancelled() {
            return Err(ReviewError::Cancelled);
        }

        let language = submission.language();
        let composer = ScoreComposer::new(config.weights);
        let mut builder = ReviewBuilder::new(submission);

        if !language.is_supported() {
            warn!("Language '{}' is not supported, running in degraded mode", language);
            builder = builder.degraded(true).note(format!(
                "Language '{}' is not supported; only language-agnostic checks were run.",
                language
            ));
        }

        // Nothing to review is a success, not an error
        if text.is_empty() {
            debug!("Empty submission, skipping analysis");
            let metrics = Metrics::perfect();
            let score = composer.score(&metrics);
            return Ok(builder
                .metrics(metrics)
                .score(score, composer.summary(score, &metrics))
                .improved_code("")
                .duration_ms(start.elapsed().as_millis() as u64)
                .build());
        }

        let source = Arc::new(SourceFile::with_line_limit(
            text,
            language.clone(),
            config.thresholds.max_line_length,
        ));
        info!(
            "Reviewing {} ({}, {} lines, {} review)",
            submission.filename(),
            language,
            source.line_count(),
            submission.review_type()
        );

        let mut engine = DetectorEngine::new(config.effective_workers());
        engine.register_all(select_detectors(config, language, submission.review_type()));
        let run = engine.run(Arc::clone(&source), deadline, cancel)?;

        let mut findings = run.findings;
        let synthesizer = FixSynthesizer::with_default_patches(config.max_auto_fixes_per_line);
        let fixes = synthesizer.synthesize(&source, &mut findings, cancel)?;

        if Instant::now() > deadline {
            warn!("Review exceeded its {}ms budget during fix synthesis", config.timeout_ms);
            return Err(ReviewError::Timeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
                partial_findings: findings,
            });
        }

        let metrics = MetricAggregator::from_config(config).aggregate(&findings, source.stats());
        let score = composer.score(&metrics);
        let summary = composer.summary(score, &metrics);

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Review complete: score {} with {} findings in {}ms",
            score,
            findings.len(),
            duration_ms
        );

        Ok(builder
            .failed_detectors(run.summary.failed)
            .detector_counts(run.summary.detectors_run, run.summary.detectors_failed)
            .fix_counts(fixes.applied, fixes.unresolved)
            .structure(source.stats().clone())
            .findings(findings)
            .metrics(metrics)
            .score(score, summary)
            .improved_code(fixes.improved_code)
            .duration_ms(duration_ms)
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Language, ReviewType};

    #[test]
    fn test_empty_submission_fast_path() {
        let review = run_review(
            &Submission::new("", Language::Python),
            &ReviewConfig::default(),
        )
        .unwrap();
        assert_eq!(review.score, 100);
        assert!(review.result.findings.is_empty());
        assert_eq!(review.result.metrics, Metrics::perfect());
        assert_eq!(review.result.improved_code, "");
        assert!(!review.degraded);
    }

    #[test]
    fn test_payload_limit() {
        let config = ReviewConfig {
            max_payload_bytes: 8,
            ..Default::default()
        };
        let err = run_review(&Submission::new("x = 1234567", Language::Python), &config)
            .unwrap_err();
        assert!(matches!(err, ReviewError::PayloadTooLarge { size: 11, limit: 8 }));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ReviewConfig::default();
        config.penalties.error = -1.0;
        assert!(matches!(
            run_review(&Submission::new("x", Language::Python), &config),
            Err(ReviewError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let result = run_review_with_cancel(
            &Submission::new("x = 1\n", Language::Python),
            &ReviewConfig::default(),
            &token,
        );
        assert!(matches!(result, Err(ReviewError::Cancelled)));
    }

    #[test]
    fn test_unsupported_language_is_degraded() {
        let review = run_review(
            &Submission::new("MOVE 1 TO X.   \n", Language::parse("COBOL")),
            &ReviewConfig::default(),
        )
        .unwrap();
        assert!(review.degraded);
        assert_eq!(review.notes.len(), 1);
        assert!(review
            .result
            .findings
            .iter()
            .any(|f| f.rule_id == "trailing-whitespace"));
    }

    #[test]
    fn test_quick_syntax_only_reports_syntax_rules() {
        let code = "def f(x):\n    if x:\n        y = 1\n    return y\n";
        let review = run_review(
            &Submission::new(code, Language::Python).with_review_type(ReviewType::QuickSyntax),
            &ReviewConfig::default(),
        )
        .unwrap();
        assert!(review.result.findings.is_empty());
        assert_eq!(review.result.improved_code, code);
    }
}
