//! Metric aggregation
//!
//! Reduces findings plus structural statistics into the five 0-100 quality
//! metrics.
//!
//! # Formula
//!
//! ```text
//! metric = clamp(100 - finding_penalty - structural_penalty, 0, 100)
//!
//! finding_penalty   = Σ penalty(severity) × weight   (findings tagged to the metric)
//!                   + Σ penalty(Error) × weight      (accuracy only: Error findings
//!                                                    tagged to other metrics)
//! structural_penalty:
//!   readability     = min((avg_len - 0.8 × max_len) / 2, 15)   when avg_len > 0.8 × max_len
//!                   + min(5 × (max_nesting - nesting_limit), 20)
//!   best practices  = min(10 × (floor - ratio) / floor, 10)     when non-blank lines
//!                                                               reach the minimum
//! ```
//!
//! Every penalty term is non-negative, so adding a finding never raises a
//! metric and removing one never lowers it.

use crate::config::{PenaltyConfig, ReviewConfig, Thresholds};
use crate::models::{Finding, MetricCategory, Metrics, Severity};
use crate::normalizer::StructuralStats;
use tracing::debug;

/// Share of the line-length limit the average line may reach before
/// readability is penalized
const AVG_LINE_LENGTH_RATIO: f64 = 0.8;
const MAX_LINE_LENGTH_PENALTY: f64 = 15.0;
const NESTING_PENALTY_PER_LEVEL: f64 = 5.0;
const MAX_NESTING_PENALTY: f64 = 20.0;
const MAX_COMMENT_RATIO_PENALTY: f64 = 10.0;

/// Penalty contributions behind one metric
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBreakdown {
    pub category: MetricCategory,
    /// Points deducted for findings
    pub finding_penalty: f64,
    /// Points deducted from structural statistics
    pub structural_penalty: f64,
    /// Findings that contributed to `finding_penalty`
    pub finding_count: usize,
}

impl CategoryBreakdown {
    fn new(category: MetricCategory) -> Self {
        Self {
            category,
            finding_penalty: 0.0,
            structural_penalty: 0.0,
            finding_count: 0,
        }
    }

    /// Final integer score for this metric
    pub fn score(&self) -> u8 {
        (100.0 - self.finding_penalty - self.structural_penalty)
            .clamp(0.0, 100.0)
            .round() as u8
    }
}

/// Breakdown for all five metrics, in canonical order
#[derive(Debug, Clone, PartialEq)]
pub struct MetricBreakdown {
    pub categories: Vec<CategoryBreakdown>,
}

impl MetricBreakdown {
    pub fn get(&self, category: MetricCategory) -> Option<&CategoryBreakdown> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn metrics(&self) -> Metrics {
        let mut metrics = Metrics::perfect();
        for c in &self.categories {
            metrics.set(c.category, c.score());
        }
        metrics
    }
}

/// Computes metrics from findings and structural statistics
#[derive(Debug, Clone)]
pub struct MetricAggregator {
    penalties: PenaltyConfig,
    thresholds: Thresholds,
}

impl MetricAggregator {
    pub fn new(penalties: PenaltyConfig, thresholds: Thresholds) -> Self {
        Self {
            penalties,
            thresholds,
        }
    }

    pub fn from_config(config: &ReviewConfig) -> Self {
        Self::new(config.penalties, config.thresholds)
    }

    /// Compute the five metrics
    pub fn aggregate(&self, findings: &[Finding], stats: &StructuralStats) -> Metrics {
        self.breakdown(findings, stats).metrics()
    }

    /// Compute the per-metric penalty breakdown
    pub fn breakdown(&self, findings: &[Finding], stats: &StructuralStats) -> MetricBreakdown {
        let mut categories: Vec<CategoryBreakdown> = MetricCategory::ALL
            .iter()
            .map(|c| CategoryBreakdown::new(*c))
            .collect();

        for finding in findings {
            let penalty = self.finding_penalty(finding);
            let slot = &mut categories[category_index(finding.category)];
            slot.finding_penalty += penalty;
            slot.finding_count += 1;

            // Errors always count against accuracy
            if finding.kind == Severity::Error && finding.category != MetricCategory::Accuracy {
                let accuracy = &mut categories[category_index(MetricCategory::Accuracy)];
                accuracy.finding_penalty += penalty;
                accuracy.finding_count += 1;
            }
        }

        categories[category_index(MetricCategory::Readability)].structural_penalty =
            self.readability_penalty(stats);
        categories[category_index(MetricCategory::BestPractices)].structural_penalty =
            self.best_practices_penalty(stats);

        for c in &categories {
            debug!(
                "Metric {}: findings={} (-{:.1}), structural -{:.1} => {}",
                c.category,
                c.finding_count,
                c.finding_penalty,
                c.structural_penalty,
                c.score()
            );
        }

        MetricBreakdown { categories }
    }

    fn finding_penalty(&self, finding: &Finding) -> f64 {
        let weight = if finding.weight.is_finite() {
            finding.weight.max(0.0)
        } else {
            1.0
        };
        self.penalties.for_severity(finding.kind) * weight
    }

    fn readability_penalty(&self, stats: &StructuralStats) -> f64 {
        let mut penalty = 0.0;

        let soft_limit = self.thresholds.max_line_length as f64 * AVG_LINE_LENGTH_RATIO;
        if stats.avg_line_length > soft_limit {
            penalty += ((stats.avg_line_length - soft_limit) / 2.0).min(MAX_LINE_LENGTH_PENALTY);
        }

        if stats.max_nesting > self.thresholds.max_nesting {
            let excess = (stats.max_nesting - self.thresholds.max_nesting) as f64;
            penalty += (excess * NESTING_PENALTY_PER_LEVEL).min(MAX_NESTING_PENALTY);
        }

        penalty
    }

    fn best_practices_penalty(&self, stats: &StructuralStats) -> f64 {
        let floor = self.thresholds.comment_ratio_floor;
        if floor <= 0.0
            || stats.non_blank_lines < self.thresholds.comment_ratio_min_lines
            || stats.comment_ratio >= floor
        {
            return 0.0;
        }
        (MAX_COMMENT_RATIO_PENALTY * (floor - stats.comment_ratio) / floor)
            .min(MAX_COMMENT_RATIO_PENALTY)
    }
}

impl Default for MetricAggregator {
    fn default() -> Self {
        Self::new(PenaltyConfig::default(), Thresholds::default())
    }
}

fn category_index(category: MetricCategory) -> usize {
    MetricCategory::ALL
        .iter()
        .position(|c| *c == category)
        .unwrap_or(0)
}
