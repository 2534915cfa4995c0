//! Unbalanced Delimiters Detector
//!
//! Matches `()`, `[]` and `{}` over the token stream, so brackets inside
//! strings and comments are ignored. In degraded mode the raw characters are
//! scanned instead.

use crate::detectors::base::Detector;
use crate::models::{DetectorClass, Finding, MetricCategory, Severity};
use crate::normalizer::{SourceFile, TokenKind};
use anyhow::Result;

pub struct UnbalancedDelimitersDetector;

impl UnbalancedDelimitersDetector {
    pub fn new() -> Self {
        Self
    }

    fn check(&self, delimiters: impl Iterator<Item = (char, u32)>) -> Vec<Finding> {
        let mut findings = Vec::new();
        let mut stack: Vec<(char, u32)> = Vec::new();

        for (c, line) in delimiters {
            match c {
                '(' | '[' | '{' => stack.push((c, line)),
                _ => {
                    let opener = opener_for(c);
                    match stack.last() {
                        Some((top, _)) if *top == opener => {
                            stack.pop();
                        }
                        Some((top, top_line)) => {
                            findings.push(self.finding(
                                line,
                                format!(
                                    "Mismatched '{}': expected '{}' to close '{}' from line {}",
                                    c,
                                    closer_for(*top),
                                    top,
                                    top_line
                                ),
                            ));
                            if let Some(pos) = stack.iter().rposition(|(o, _)| *o == opener) {
                                stack.truncate(pos);
                            }
                        }
                        None => {
                            findings.push(
                                self.finding(line, format!("Unexpected '{}' with no matching '{}'", c, opener)),
                            );
                        }
                    }
                }
            }
        }

        for (c, line) in stack {
            findings.push(self.finding(line, format!("Unclosed '{}'", c)));
        }
        findings
    }
}

impl Default for UnbalancedDelimitersDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn opener_for(closer: char) -> char {
    match closer {
        ')' => '(',
        ']' => '[',
        _ => '{',
    }
}

fn closer_for(opener: char) -> char {
    match opener {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '(' | ')' | '[' | ']' | '{' | '}')
}

impl Detector for UnbalancedDelimitersDetector {
    fn name(&self) -> &'static str {
        "unbalanced-delimiters"
    }

    fn description(&self) -> &'static str {
        "Detects unclosed or mismatched brackets, braces and parentheses"
    }

    fn class(&self) -> DetectorClass {
        DetectorClass::Syntax
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::Accuracy
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>> {
        if source.degraded() {
            let chars = source
                .lines()
                .iter()
                .enumerate()
                .flat_map(|(i, line)| line.chars().map(move |c| (c, i as u32 + 1)))
                .filter(|(c, _)| is_delimiter(*c));
            return Ok(self.check(chars));
        }

        let chars = source
            .tokens()
            .filter(|t| t.kind == TokenKind::Punct)
            .filter_map(|t| {
                let mut chars = t.text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if is_delimiter(c) => Some((c, t.line)),
                    _ => None,
                }
            });
        Ok(self.check(chars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;

    fn run(code: &str, lang: Language) -> Vec<Finding> {
        UnbalancedDelimitersDetector::new()
            .inspect(&SourceFile::new(code, lang))
            .unwrap()
    }

    #[test]
    fn test_balanced() {
        assert!(run("f(a[1], {'k': (2)})\n", Language::Python).is_empty());
    }

    #[test]
    fn test_brackets_in_strings_ignored() {
        assert!(run("s = '(['\n# )\n", Language::Python).is_empty());
        assert!(run("const s = \"{\"; // }\n", Language::JavaScript).is_empty());
    }

    #[test]
    fn test_unclosed_opener_reports_its_line() {
        let findings = run("x = foo(\n  1,\n", Language::Python);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 1);
        assert!(findings[0].message.contains("Unclosed '('"));
    }

    #[test]
    fn test_stray_closer() {
        let findings = run("int x = 1;\n}\n", Language::C);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 2);
    }

    #[test]
    fn test_mismatch() {
        let findings = run("a = [1, 2)\n", Language::Python);
        assert!(findings.iter().any(|f| f.message.starts_with("Mismatched ')'")));
    }

    #[test]
    fn test_degraded_mode_scans_raw_chars() {
        let findings = run("DISPLAY (A\n", Language::parse("COBOL"));
        assert_eq!(findings.len(), 1);
    }
}
