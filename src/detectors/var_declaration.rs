//! `var` Declaration Detector (JavaScript/TypeScript)

use crate::detectors::base::Detector;
use crate::models::{Finding, Language, MetricCategory, Severity};
use crate::normalizer::{SourceFile, Token, TokenKind};
use anyhow::Result;

pub struct VarDeclarationDetector;

impl VarDeclarationDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VarDeclarationDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for VarDeclarationDetector {
    fn name(&self) -> &'static str {
        "var-declaration"
    }

    fn description(&self) -> &'static str {
        "Detects function-scoped var declarations"
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::BestPractices
    }

    fn severity(&self) -> Severity {
        Severity::Suggestion
    }

    fn applies_to(&self, language: &Language) -> bool {
        language.is_js_like()
    }

    fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>> {
        let tokens: Vec<Token> = source
            .tokens()
            .filter(|t| t.kind != TokenKind::Comment)
            .collect();
        Ok(tokens
            .iter()
            .enumerate()
            .filter(|(i, t)| {
                // `obj.var` is a property, not a declaration
                let member = i
                    .checked_sub(1)
                    .and_then(|p| tokens.get(p))
                    .is_some_and(|p| p.is_punct("."));
                t.is_keyword("var") && !member
            })
            .map(|(_, t)| {
                self.finding(
                    t.line,
                    "Use 'let' or 'const' instead of 'var'; 'var' is function-scoped and hoisted",
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_var() {
        let code = "var a = 1;\nlet b = 2;\nfor (var i = 0; i < 3; i++) {}\nconfig.var = 3;\n";
        let src = SourceFile::new(code, Language::JavaScript);
        let lines: Vec<u32> = VarDeclarationDetector::new()
            .inspect(&src)
            .unwrap()
            .iter()
            .map(|f| f.line)
            .collect();
        assert_eq!(lines, vec![1, 3]);
    }
}
