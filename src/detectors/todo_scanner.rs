//! TODO/FIXME Scanner
//!
//! Scans comments for TODO, FIXME, HACK and XXX task markers. Only comment
//! tokens are searched, so a `"TODO"` string literal is not reported. In
//! degraded mode there are no comment tokens and raw lines are searched.

use crate::detectors::base::Detector;
use crate::models::{Finding, MetricCategory, Severity};
use crate::normalizer::{SourceFile, TokenKind};
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

static TODO_PATTERN: OnceLock<Regex> = OnceLock::new();

fn get_pattern() -> &'static Regex {
    TODO_PATTERN.get_or_init(|| {
        Regex::new(r"\b(TODO|FIXME|HACK|XXX)\b[\s:(\-]*(.{0,80})").expect("valid regex")
    })
}

pub struct TodoScanner;

impl TodoScanner {
    pub fn new() -> Self {
        Self
    }

    fn scan(&self, line: u32, text: &str) -> Option<Finding> {
        let caps = get_pattern().captures(text)?;
        let tag = caps.get(1)?.as_str();
        let note = caps
            .get(2)
            .map(|m| m.as_str().trim().trim_end_matches(['*', '/']).trim())
            .unwrap_or("");
        let message = if note.is_empty() {
            format!("Unresolved {} comment", tag)
        } else {
            format!("Unresolved {} comment: {}", tag, note)
        };
        Some(self.finding(line, message))
    }
}

impl Default for TodoScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for TodoScanner {
    fn name(&self) -> &'static str {
        "todo-comment"
    }

    fn description(&self) -> &'static str {
        "Finds TODO, FIXME, HACK comments"
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::BestPractices
    }

    fn severity(&self) -> Severity {
        Severity::Suggestion
    }

    fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>> {
        if source.degraded() {
            return Ok(source
                .lines()
                .iter()
                .enumerate()
                .filter_map(|(i, line)| self.scan(i as u32 + 1, line))
                .collect());
        }

        let mut findings = vec![];
        for token in source.tokens().filter(|t| t.kind == TokenKind::Comment) {
            for (offset, text) in token.text.lines().enumerate() {
                if let Some(finding) = self.scan(token.line + offset as u32, text) {
                    findings.push(finding);
                }
            }
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;

    #[test]
    fn test_detects_todo_fixme_hack() {
        let code = "# TODO: handle empty input\nx = 1  # FIXME\n/* not python */\n# HACK(bob) retry twice\n";
        let src = SourceFile::new(code, Language::Python);
        let findings = TodoScanner::new().inspect(&src).unwrap();
        let lines: Vec<u32> = findings.iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![1, 2, 4]);
        assert_eq!(findings[0].message, "Unresolved TODO comment: handle empty input");
        assert_eq!(findings[1].message, "Unresolved FIXME comment");
    }

    #[test]
    fn test_block_comment_lines() {
        let code = "/*\n * TODO: split this\n */\nint x;\n";
        let src = SourceFile::new(code, Language::C);
        let findings = TodoScanner::new().inspect(&src).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 2);
    }

    #[test]
    fn test_no_finding_for_clean_comments_or_strings() {
        let code = "# regular comment\ns = \"TODO\"\ntodos = []\n";
        let src = SourceFile::new(code, Language::Python);
        assert!(TodoScanner::new().inspect(&src).unwrap().is_empty());
    }
}
