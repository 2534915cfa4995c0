//! critique - deterministic code review engine
//!
//! Takes one source-code submission and produces line-attributed findings,
//! five 0-100 quality metrics, an aggregate score with a summary, and an
//! automatically fixed version of the code.
//!
//! ```no_run
//! use critique::config::ReviewConfig;
//! use critique::models::{Language, Submission};
//!
//! let submission = Submission::new("def f(x):\n    return x + 1\n", Language::Python);
//! let review = critique::run_review(&submission, &ReviewConfig::default())?;
//! println!("{}: {}", review.score, review.result.summary);
//! # Ok::<(), critique::ReviewError>(())
//! ```

pub mod cancel;
pub mod config;
pub mod detectors;
pub mod error;
pub mod fixes;
pub mod metrics;
pub mod models;
pub mod normalizer;
pub mod parsers;
pub mod pipeline;
pub mod reporters;
pub mod review;
pub mod scoring;

pub use cancel::CancellationToken;
pub use error::ReviewError;
pub use pipeline::{run_review, run_review_with_cancel, ReviewPipeline};
