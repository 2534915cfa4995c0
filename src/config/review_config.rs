//! Per-invocation review configuration
//!
//! Loaded from `critique.toml` (or an explicit path), falling back to the
//! user config directory and finally to built-in defaults.
//!
//! # Configuration Format
//!
//! ```toml
//! # critique.toml
//! timeout_ms = 10000
//! max_payload_bytes = 1048576
//! max_auto_fixes_per_line = 1
//! workers = 0
//! enabled_detectors = "all"     # all | syntax | security
//! disabled_rules = ["todo-comment"]
//!
//! [weights]
//! accuracy = 0.30
//! readability = 0.20
//! performance = 0.20
//! best_practices = 0.15
//! security = 0.15
//!
//! [penalties]
//! error = 15.0
//! warning = 8.0
//! suggestion = 3.0
//!
//! [thresholds]
//! max_line_length = 100
//! max_nesting = 4
//! ```

use crate::error::{Result, ReviewError};
use crate::models::{MetricCategory, ReviewType, Severity};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default per-request budget
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default submission size cap (1 MiB)
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Project-local config filename
pub const CONFIG_FILE_NAME: &str = "critique.toml";

/// Which detector classes may run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DetectorSelection {
    #[default]
    All,
    Syntax,
    Security,
}

impl DetectorSelection {
    /// Selection implied by a submission's review type
    pub fn for_review_type(review_type: ReviewType) -> Self {
        match review_type {
            ReviewType::Full => DetectorSelection::All,
            ReviewType::QuickSyntax => DetectorSelection::Syntax,
            ReviewType::SecurityOnly => DetectorSelection::Security,
        }
    }

    /// Combine the configured selection with a submission's review type.
    /// A non-full review type takes precedence; a full review defers to
    /// the configured selection.
    pub fn effective(self, review_type: ReviewType) -> Self {
        match DetectorSelection::for_review_type(review_type) {
            DetectorSelection::All => self,
            narrowed => {
                if self != DetectorSelection::All && self != narrowed {
                    warn!(
                        "Review type {} overrides configured detector selection {:?}",
                        review_type, self
                    );
                }
                narrowed
            }
        }
    }
}

/// Weights for the aggregate score (must sum to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_accuracy_weight")]
    pub accuracy: f64,
    #[serde(default = "default_readability_weight")]
    pub readability: f64,
    #[serde(default = "default_performance_weight")]
    pub performance: f64,
    #[serde(default = "default_best_practices_weight")]
    pub best_practices: f64,
    #[serde(default = "default_security_weight")]
    pub security: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            accuracy: default_accuracy_weight(),
            readability: default_readability_weight(),
            performance: default_performance_weight(),
            best_practices: default_best_practices_weight(),
            security: default_security_weight(),
        }
    }
}

fn default_accuracy_weight() -> f64 {
    0.30
}
fn default_readability_weight() -> f64 {
    0.20
}
fn default_performance_weight() -> f64 {
    0.20
}
fn default_best_practices_weight() -> f64 {
    0.15
}
fn default_security_weight() -> f64 {
    0.15
}

impl ScoreWeights {
    pub fn get(&self, category: MetricCategory) -> f64 {
        match category {
            MetricCategory::Accuracy => self.accuracy,
            MetricCategory::Readability => self.readability,
            MetricCategory::Performance => self.performance,
            MetricCategory::BestPractices => self.best_practices,
            MetricCategory::Security => self.security,
        }
    }

    pub fn sum(&self) -> f64 {
        MetricCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }

    /// Validate that weights sum to 1.0 (with tolerance)
    pub fn is_valid(&self) -> bool {
        (self.sum() - 1.0).abs() < 0.001
    }

    /// Normalize weights to sum to 1.0
    pub fn normalize(&mut self) {
        let sum = self.sum();
        if sum > 0.0 {
            self.accuracy /= sum;
            self.readability /= sum;
            self.performance /= sum;
            self.best_practices /= sum;
            self.security /= sum;
        }
    }
}

/// Base penalty per finding severity, before detector weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyConfig {
    #[serde(default = "default_error_penalty")]
    pub error: f64,
    #[serde(default = "default_warning_penalty")]
    pub warning: f64,
    #[serde(default = "default_suggestion_penalty")]
    pub suggestion: f64,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            error: default_error_penalty(),
            warning: default_warning_penalty(),
            suggestion: default_suggestion_penalty(),
        }
    }
}

fn default_error_penalty() -> f64 {
    15.0
}
fn default_warning_penalty() -> f64 {
    8.0
}
fn default_suggestion_penalty() -> f64 {
    3.0
}

impl PenaltyConfig {
    pub fn for_severity(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Error => self.error,
            Severity::Warning => self.warning,
            Severity::Suggestion => self.suggestion,
        }
    }
}

/// Thresholds shared by structural detectors and the metric aggregator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    #[serde(default = "default_max_nesting")]
    pub max_nesting: u32,
    /// Functions with fewer body lines are exempt from type-hint findings
    #[serde(default = "default_min_function_lines")]
    pub min_function_lines: usize,
    #[serde(default = "default_comment_ratio_floor")]
    pub comment_ratio_floor: f64,
    /// Comment ratio only matters for files at least this long
    #[serde(default = "default_comment_ratio_min_lines")]
    pub comment_ratio_min_lines: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_line_length: default_max_line_length(),
            max_nesting: default_max_nesting(),
            min_function_lines: default_min_function_lines(),
            comment_ratio_floor: default_comment_ratio_floor(),
            comment_ratio_min_lines: default_comment_ratio_min_lines(),
        }
    }
}

fn default_max_line_length() -> usize {
    100
}
fn default_max_nesting() -> u32 {
    4
}
fn default_min_function_lines() -> usize {
    4
}
fn default_comment_ratio_floor() -> f64 {
    0.05
}
fn default_comment_ratio_min_lines() -> usize {
    30
}

/// Everything that tunes one `run_review` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewConfig {
    #[serde(default)]
    pub weights: ScoreWeights,

    #[serde(default)]
    pub enabled_detectors: DetectorSelection,

    /// Rule IDs that never run
    #[serde(default)]
    pub disabled_rules: Vec<String>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_auto_fixes_per_line")]
    pub max_auto_fixes_per_line: usize,

    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,

    /// Detector worker threads (0 = auto-detect)
    #[serde(default)]
    pub workers: usize,

    #[serde(default)]
    pub penalties: PenaltyConfig,

    #[serde(default)]
    pub thresholds: Thresholds,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            enabled_detectors: DetectorSelection::All,
            disabled_rules: Vec::new(),
            timeout_ms: default_timeout_ms(),
            max_auto_fixes_per_line: default_max_auto_fixes_per_line(),
            max_payload_bytes: default_max_payload_bytes(),
            workers: 0,
            penalties: PenaltyConfig::default(),
            thresholds: Thresholds::default(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}
fn default_max_auto_fixes_per_line() -> usize {
    1
}
fn default_max_payload_bytes() -> usize {
    DEFAULT_MAX_PAYLOAD_BYTES
}

impl ReviewConfig {
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_selection(mut self, selection: DetectorSelection) -> Self {
        self.enabled_detectors = selection;
        self
    }

    pub fn disable_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.disabled_rules.push(rule_id.into());
        self
    }

    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        !self.disabled_rules.iter().any(|r| r == rule_id)
    }

    /// Resolve `workers = 0` to the machine's parallelism, capped at 16
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
                .min(16)
        } else {
            self.workers
        }
    }

    /// Reject configurations the engine cannot honor, and normalize
    /// weights that do not sum to 1.0.
    pub fn validate(&mut self) -> Result<()> {
        let weights = &self.weights;
        if MetricCategory::ALL
            .iter()
            .any(|c| !weights.get(*c).is_finite() || weights.get(*c) < 0.0)
        {
            return Err(ReviewError::invalid_config(
                "score weights must be finite and non-negative",
            ));
        }
        if weights.sum() <= 0.0 {
            return Err(ReviewError::invalid_config(
                "at least one score weight must be positive",
            ));
        }
        if !weights.is_valid() {
            warn!(
                "Score weights sum to {:.3}, normalizing to 1.0",
                weights.sum()
            );
            self.weights.normalize();
        }

        let p = &self.penalties;
        if [p.error, p.warning, p.suggestion]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(ReviewError::invalid_config(
                "penalties must be finite and non-negative",
            ));
        }
        if self.max_payload_bytes == 0 {
            return Err(ReviewError::invalid_config(
                "max_payload_bytes must be greater than zero",
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ReviewError::invalid_config(
                "timeout_ms must be greater than zero",
            ));
        }
        if self.max_auto_fixes_per_line == 0 {
            return Err(ReviewError::invalid_config(
                "max_auto_fixes_per_line must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Location of the user-level config file
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("critique").join("config.toml"))
}

/// Load review configuration.
///
/// Searches in this order:
/// 1. `explicit` path, if given
/// 2. `critique.toml` in `base_dir`
/// 3. the user config directory (`~/.config/critique/config.toml`)
///
/// Returns default configuration if no config file is found or the file
/// cannot be parsed.
pub fn load_review_config(explicit: Option<&Path>, base_dir: &Path) -> ReviewConfig {
    let candidates: Vec<PathBuf> = match explicit {
        Some(path) => vec![path.to_path_buf()],
        None => std::iter::once(base_dir.join(CONFIG_FILE_NAME))
            .chain(user_config_path())
            .collect(),
    };

    for path in candidates {
        if !path.exists() {
            if explicit.is_some() {
                warn!("Config file {} not found, using defaults", path.display());
            }
            continue;
        }
        match load_toml_config(&path) {
            Ok(config) => {
                debug!("Loaded review config from {}", path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
                return ReviewConfig::default();
            }
        }
    }

    ReviewConfig::default()
}

fn load_toml_config(path: &Path) -> anyhow::Result<ReviewConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ReviewConfig = toml::from_str(&content)?;
    Ok(config)
}
