//! Loose Equality Detector (JavaScript/TypeScript)
//!
//! Flags `==` and `!=`, which coerce operand types before comparing.
//! Comparisons against `null` are allowed: `x == null` is the common idiom
//! for "null or undefined".

use crate::detectors::base::Detector;
use crate::models::{Finding, Language, MetricCategory, Severity};
use crate::normalizer::{SourceFile, Token, TokenKind};
use anyhow::Result;

pub struct LooseEqualityDetector;

impl LooseEqualityDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LooseEqualityDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for LooseEqualityDetector {
    fn name(&self) -> &'static str {
        "loose-equality"
    }

    fn description(&self) -> &'static str {
        "Detects == and != comparisons that rely on type coercion"
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::Accuracy
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self, language: &Language) -> bool {
        language.is_js_like()
    }

    fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>> {
        let tokens: Vec<Token> = source
            .tokens()
            .filter(|t| t.kind != TokenKind::Comment)
            .collect();
        let is_null = |i: Option<&Token>| i.is_some_and(|t| t.is_keyword("null"));

        let mut findings = vec![];
        for (i, tok) in tokens.iter().enumerate() {
            let strict = match tok.text.as_str() {
                "==" if tok.kind == TokenKind::Punct => "===",
                "!=" if tok.kind == TokenKind::Punct => "!==",
                _ => continue,
            };
            let prev = i.checked_sub(1).and_then(|p| tokens.get(p));
            if is_null(prev) || is_null(tokens.get(i + 1)) {
                continue;
            }
            findings.push(
                self.finding(
                    tok.line,
                    format!(
                        "Use '{}' instead of '{}' to avoid implicit type coercion",
                        strict, tok.text
                    ),
                )
                .with_suggestion(strict),
            );
        }
        Ok(findings)
    }
}
