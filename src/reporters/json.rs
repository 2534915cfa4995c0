//! JSON reporter
//!
//! Outputs the full Review as pretty-printed JSON, in the camelCase shape
//! the display layer and history store consume.

use crate::models::Review;
use anyhow::Result;

/// Render review as JSON
pub fn render(review: &Review) -> Result<String> {
    Ok(serde_json::to_string_pretty(review)?)
}

/// Render review as compact JSON (single line)
pub fn render_compact(review: &Review) -> Result<String> {
    Ok(serde_json::to_string(review)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_review;

    #[test]
    fn test_json_render_valid() {
        let review = test_review();
        let json_str = render(&review).expect("render JSON");
        let parsed: serde_json::Value = serde_json::from_str(&json_str).expect("parse JSON");
        assert_eq!(parsed["score"], 99);
        assert_eq!(parsed["result"]["findings"][0]["ruleId"], "trailing-whitespace");
        assert_eq!(parsed["result"]["improvedCode"], "x = 1\n");
    }

    #[test]
    fn test_json_render_compact() {
        let review = test_review();
        let json_str = render_compact(&review).expect("render compact JSON");
        assert!(!json_str.contains('\n'));
        let back: Review = serde_json::from_str(&json_str).expect("parse compact JSON");
        assert_eq!(back.result, review.result);
    }
}
