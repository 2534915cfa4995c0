//! Empty Catch Block Detector
//!
//! Detects catch/except blocks that silently swallow exceptions:
//! - Python: an `except` clause whose body is only `pass` or `...`
//! - Brace languages: `catch (...) {}` with nothing between the braces
//!
//! A comment inside the braces counts as content, since it usually
//! documents an intentional swallow.

use crate::detectors::base::Detector;
use crate::detectors::python;
use crate::models::{Finding, Language, MetricCategory, Severity};
use crate::normalizer::{SourceFile, Token};
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

static EXCEPT_HEADER: OnceLock<Regex> = OnceLock::new();
static INLINE_EMPTY: OnceLock<Regex> = OnceLock::new();

fn except_header() -> &'static Regex {
    EXCEPT_HEADER.get_or_init(|| Regex::new(r"^except\b.*:$").expect("valid regex"))
}

fn inline_empty() -> &'static Regex {
    INLINE_EMPTY.get_or_init(|| {
        Regex::new(r"^except\b.*:\s*(pass|\.\.\.)\s*;?$").expect("valid regex")
    })
}

pub struct EmptyCatchDetector;

impl EmptyCatchDetector {
    pub fn new() -> Self {
        Self
    }

    fn python_findings(&self, source: &SourceFile) -> Vec<Finding> {
        let code = |n: u32| source.code(n).unwrap_or("").trim().to_string();
        let stmts = python::statements(source);
        let mut findings = vec![];

        for (i, stmt) in stmts.iter().enumerate() {
            let header = code(stmt.start);
            if inline_empty().is_match(&header) {
                findings.push(self.report(stmt.start));
                continue;
            }
            if !except_header().is_match(&header) {
                continue;
            }
            let body: Vec<_> = stmts[i + 1..]
                .iter()
                .take_while(|s| s.indent > stmt.indent)
                .collect();
            if let [only] = body.as_slice() {
                if matches!(code(only.start).as_str(), "pass" | "...") {
                    findings.push(self.report(stmt.start));
                }
            }
        }
        findings
    }

    fn brace_findings(&self, source: &SourceFile) -> Vec<Finding> {
        let tokens: Vec<Token> = source.tokens().collect();
        let mut findings = vec![];

        for (i, tok) in tokens.iter().enumerate() {
            if tok.text != "catch" {
                continue;
            }
            let mut j = i + 1;
            if tokens.get(j).is_some_and(|t| t.is_punct("(")) {
                let mut depth = 0;
                while let Some(t) = tokens.get(j) {
                    if t.is_punct("(") {
                        depth += 1;
                    } else if t.is_punct(")") {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    j += 1;
                }
                j += 1;
            }
            let opens = tokens.get(j).is_some_and(|t| t.is_punct("{"));
            let closes = tokens.get(j + 1).is_some_and(|t| t.is_punct("}"));
            if opens && closes {
                findings.push(self.report(tok.line));
            }
        }
        findings
    }

    fn report(&self, line: u32) -> Finding {
        self.finding(
            line,
            "Empty exception handler silently swallows errors; log, handle or re-raise the exception",
        )
    }
}

impl Default for EmptyCatchDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for EmptyCatchDetector {
    fn name(&self) -> &'static str {
        "empty-catch"
    }

    fn description(&self) -> &'static str {
        "Detects empty catch/except blocks that swallow exceptions"
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::BestPractices
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self, language: &Language) -> bool {
        matches!(
            language,
            Language::Python
                | Language::JavaScript
                | Language::TypeScript
                | Language::Java
                | Language::Cpp
                | Language::CSharp
        )
    }

    fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>> {
        if *source.language() == Language::Python {
            Ok(self.python_findings(source))
        } else {
            Ok(self.brace_findings(source))
        }
    }
}
