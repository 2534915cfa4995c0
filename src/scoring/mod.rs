//! Score composition
//!
//! Combines the five metrics into one aggregate score and a short
//! human-readable summary.
//!
//! # Scoring Formula
//!
//! ```text
//! score = round(0.30 × accuracy + 0.20 × readability + 0.20 × performance
//!             + 0.15 × best_practices + 0.15 × security)
//! ```
//!
//! The weights come from [`ScoreWeights`] and can be overridden per review.
//!
//! # Summary Brackets
//!
//! - 85 and above: well-structured
//! - 60 to 84: generally solid with some issues
//! - below 60: needs significant revision
//!
//! The summary then names the weakest metric as the focus area. Ties go to
//! the metric with the larger weight, then to canonical metric order.

use crate::config::ScoreWeights;
use crate::models::{MetricCategory, Metrics};
use tracing::debug;

/// Lowest score in the "well-structured" bracket
pub const WELL_STRUCTURED_MIN: u8 = 85;

/// Lowest score in the "generally solid" bracket
pub const SOLID_MIN: u8 = 60;

/// Turns metrics into a score and summary
#[derive(Debug, Clone)]
pub struct ScoreComposer {
    weights: ScoreWeights,
}

impl ScoreComposer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Unrounded weighted combination of the metrics
    pub fn weighted_sum(&self, metrics: &Metrics) -> f64 {
        metrics
            .iter()
            .map(|(category, value)| self.weights.get(category) * value as f64)
            .sum()
    }

    /// Aggregate score in `[0, 100]`
    pub fn score(&self, metrics: &Metrics) -> u8 {
        let score = self.weighted_sum(metrics).round().clamp(0.0, 100.0) as u8;
        debug!("Composed score {} from {:?}", score, metrics);
        score
    }

    /// Metric most in need of attention, or `None` when all are perfect
    pub fn focus_area(&self, metrics: &Metrics) -> Option<(MetricCategory, u8)> {
        metrics
            .iter()
            .filter(|(_, value)| *value < 100)
            .min_by(|(ca, va), (cb, vb)| {
                va.cmp(vb).then_with(|| {
                    self.weights
                        .get(*cb)
                        .total_cmp(&self.weights.get(*ca))
                })
            })
    }

    /// Bracket sentence plus the focus area
    pub fn summary(&self, score: u8, metrics: &Metrics) -> String {
        let bracket = if score >= WELL_STRUCTURED_MIN {
            "The code is well-structured."
        } else if score >= SOLID_MIN {
            "The code is generally solid with some issues."
        } else {
            "The code needs significant revision."
        };

        match self.focus_area(metrics) {
            Some((category, value)) => format!(
                "{} Focus on improving {} ({}/100).",
                bracket,
                category.label(),
                value
            ),
            None => format!("{} No specific area needs attention.", bracket),
        }
    }
}

impl Default for ScoreComposer {
    fn default() -> Self {
        Self::new(ScoreWeights::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(values: [u8; 5]) -> Metrics {
        Metrics {
            accuracy: values[0],
            readability: values[1],
            performance: values[2],
            best_practices: values[3],
            security: values[4],
        }
    }

    #[test]
    fn test_perfect_score() {
        let composer = ScoreComposer::default();
        assert_eq!(composer.score(&Metrics::perfect()), 100);
        assert_eq!(
            composer.summary(100, &Metrics::perfect()),
            "The code is well-structured. No specific area needs attention."
        );
    }

    #[test]
    fn test_weighted_formula() {
        let composer = ScoreComposer::default();
        let m = metrics([80, 90, 70, 60, 100]);
        // 24 + 18 + 14 + 9 + 15 = 80
        assert_eq!(composer.score(&m), 80);
    }

    #[test]
    fn test_rounding() {
        let composer = ScoreComposer::default();
        let m = metrics([97, 100, 100, 100, 100]);
        // 99.1
        assert_eq!(composer.score(&m), 99);
        let m = metrics([95, 100, 100, 100, 99]);
        // 98.35
        assert_eq!(composer.score(&m), 98);
    }

    #[test]
    fn test_zero_metrics() {
        assert_eq!(ScoreComposer::default().score(&metrics([0; 5])), 0);
    }

    #[test]
    fn test_custom_weights() {
        let composer = ScoreComposer::new(ScoreWeights {
            accuracy: 1.0,
            readability: 0.0,
            performance: 0.0,
            best_practices: 0.0,
            security: 0.0,
        });
        assert_eq!(composer.score(&metrics([42, 100, 100, 100, 100])), 42);
    }

    #[test]
    fn test_summary_brackets() {
        let composer = ScoreComposer::default();
        let m = metrics([100, 100, 89, 100, 100]);
        assert_eq!(
            composer.summary(97, &m),
            "The code is well-structured. Focus on improving performance (89/100)."
        );
        assert!(composer
            .summary(70, &m)
            .starts_with("The code is generally solid with some issues."));
        assert!(composer
            .summary(59, &m)
            .starts_with("The code needs significant revision."));
    }

    #[test]
    fn test_focus_tie_prefers_heavier_metric() {
        let composer = ScoreComposer::default();
        let m = metrics([100, 90, 100, 90, 100]);
        assert_eq!(
            composer.focus_area(&m),
            Some((MetricCategory::Readability, 90))
        );
    }

    #[test]
    fn test_focus_tie_on_equal_weights_uses_canonical_order() {
        let composer = ScoreComposer::default();
        let m = metrics([100, 100, 100, 70, 70]);
        assert_eq!(
            composer.focus_area(&m),
            Some((MetricCategory::BestPractices, 70))
        );
    }
}
