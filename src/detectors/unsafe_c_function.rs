//! Unsafe C Function Detector (C/C++)
//!
//! Flags calls to standard library functions that write into a buffer
//! without a bound.
//!
//! CWE-120: Buffer Copy without Checking Size of Input

use crate::detectors::base::Detector;
use crate::models::{DetectorClass, Finding, Language, MetricCategory, Severity};
use crate::normalizer::{SourceFile, Token, TokenKind};
use anyhow::Result;

/// Unbounded function and its bounded replacement
const UNSAFE_FUNCTIONS: &[(&str, &str)] = &[
    ("gets", "fgets(buf, sizeof buf, stdin)"),
    ("strcpy", "strncpy or strlcpy with the destination size"),
    ("strcat", "strncat or strlcat with the destination size"),
    ("sprintf", "snprintf with the destination size"),
    ("vsprintf", "vsnprintf with the destination size"),
];

pub struct UnsafeCFunctionDetector;

impl UnsafeCFunctionDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnsafeCFunctionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for UnsafeCFunctionDetector {
    fn name(&self) -> &'static str {
        "unsafe-c-function"
    }

    fn description(&self) -> &'static str {
        "Detects unbounded buffer functions such as gets and strcpy"
    }

    fn class(&self) -> DetectorClass {
        DetectorClass::Security
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::Security
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn applies_to(&self, language: &Language) -> bool {
        matches!(language, Language::C | Language::Cpp)
    }

    fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>> {
        let tokens: Vec<Token> = source
            .tokens()
            .filter(|t| t.kind != TokenKind::Comment)
            .collect();

        let mut findings = vec![];
        for (i, tok) in tokens.iter().enumerate() {
            if tok.kind != TokenKind::Ident {
                continue;
            }
            let Some((name, replacement)) = UNSAFE_FUNCTIONS.iter().find(|(f, _)| *f == tok.text)
            else {
                continue;
            };
            let calls = tokens.get(i + 1).is_some_and(|t| t.is_punct("("));
            let member = i
                .checked_sub(1)
                .and_then(|p| tokens.get(p))
                .is_some_and(|p| p.is_punct(".") || p.is_punct("->"));
            if calls && !member {
                findings.push(
                    self.finding(
                        tok.line,
                        format!("'{}' does not bound its writes and can overflow the buffer", name),
                    )
                    .with_suggestion(format!("Use {}", replacement)),
                );
            }
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_unsafe_calls() {
        let code = "char buf[8];\ngets(buf);\nstrcpy(buf, src);\nsnprintf(buf, 8, \"%s\", s);\n// strcat(a, b);\nobj->sprintf(x);\n";
        let src = SourceFile::new(code, Language::C);
        let findings = UnsafeCFunctionDetector::new().inspect(&src).unwrap();
        let lines: Vec<u32> = findings.iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![2, 3]);
        assert_eq!(findings[0].suggested_fix.as_deref(), Some("Use fgets(buf, sizeof buf, stdin)"));
    }
}
