//! Output reporters for critique reviews
//!
//! Supports two output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON of the full review record

mod json;
mod text;

pub use json::render_compact as render_json_compact;

use crate::models::Review;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: text, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render a review in the specified format
pub fn report(review: &Review, format: &str) -> Result<String> {
    let fmt = OutputFormat::from_str(format)?;
    report_with_format(review, fmt)
}

/// Render a review using an OutputFormat enum
pub fn report_with_format(review: &Review, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(review),
        OutputFormat::Json => json::render(review),
    }
}

/// Get the recommended file extension for a format
pub fn file_extension(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text => "txt",
        OutputFormat::Json => "json",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Finding, Language, MetricCategory, Metrics, Severity, Submission};
    use crate::review::ReviewBuilder;

    /// Create a small review for testing
    pub(crate) fn test_review() -> Review {
        let submission = Submission::new("x = 1 \n", Language::Python).with_filename("demo.py");
        let finding = Finding::new(
            "trailing-whitespace",
            Severity::Suggestion,
            1,
            "Trailing whitespace",
            MetricCategory::Readability,
        )
        .fixable(true);
        ReviewBuilder::new(&submission)
            .findings(vec![finding])
            .metrics(Metrics {
                readability: 97,
                ..Metrics::perfect()
            })
            .score(99, "The code is well-structured. Focus on improving readability (97/100).")
            .improved_code("x = 1\n")
            .build()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::from_str("sarif").is_err());
    }

    #[test]
    fn test_report_dispatch() {
        let review = test_review();
        assert!(report(&review, "json").unwrap().starts_with('{'));
        assert!(report(&review, "text").unwrap().contains("demo.py"));
        assert_eq!(file_extension(OutputFormat::Json), "json");
    }
}
