//! Configuration module for critique
//!
//! This module handles:
//! - Score weights and per-severity penalties
//! - Detector selection and rule disabling
//! - Timeouts, payload limits and worker counts
//! - Structural thresholds

mod review_config;

pub use review_config::{
    load_review_config, user_config_path, DetectorSelection, PenaltyConfig, ReviewConfig,
    ScoreWeights, Thresholds, CONFIG_FILE_NAME, DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_TIMEOUT_MS,
};
