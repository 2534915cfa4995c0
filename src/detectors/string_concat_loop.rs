//! String Concatenation in Loop Detector
//!
//! Repeated `s += "..."` inside a loop copies the accumulated string on every
//! iteration. Python loop bodies are found by indentation; brace languages
//! by tracking the `{` that follows a `for`/`while`/`do` header.

use crate::detectors::base::Detector;
use crate::detectors::python;
use crate::models::{Finding, Language, MetricCategory, Severity};
use crate::normalizer::{SourceFile, Token, TokenKind};
use anyhow::Result;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

static PY_LOOP: OnceLock<Regex> = OnceLock::new();
static PY_STRING_CONCAT: OnceLock<Regex> = OnceLock::new();

fn py_loop() -> &'static Regex {
    PY_LOOP.get_or_init(|| Regex::new(r"^(async\s+)?(for|while)\b.*:$").expect("valid regex"))
}

fn py_string_concat() -> &'static Regex {
    PY_STRING_CONCAT.get_or_init(|| {
        Regex::new(r#"^[A-Za-z_][\w.\[\]]*\s*\+=\s*[A-Za-z]{0,2}["']"#).expect("valid regex")
    })
}

fn fix_hint(language: &Language) -> &'static str {
    match language {
        Language::Python => "Append parts to a list and call ''.join(parts) after the loop",
        Language::Java => "Use a StringBuilder and call append() inside the loop",
        _ => "Push parts to an array and call parts.join('') after the loop",
    }
}

pub struct StringConcatLoopDetector;

impl StringConcatLoopDetector {
    pub fn new() -> Self {
        Self
    }

    fn python_lines(&self, source: &SourceFile) -> BTreeSet<u32> {
        let code = |n: u32| source.code(n).unwrap_or("").trim().to_string();
        let stmts = python::statements(source);
        let mut lines = BTreeSet::new();

        for (i, header) in stmts.iter().enumerate() {
            if !py_loop().is_match(&code(header.start)) {
                continue;
            }
            for stmt in stmts[i + 1..].iter().take_while(|s| s.indent > header.indent) {
                // Raw text: masking blanks the quote after a string prefix
                let raw = source.line(stmt.start).unwrap_or("").trim();
                if py_string_concat().is_match(raw) {
                    lines.insert(stmt.start);
                }
            }
        }
        lines
    }

    fn brace_lines(&self, source: &SourceFile) -> BTreeSet<u32> {
        let tokens: Vec<Token> = source
            .tokens()
            .filter(|t| t.kind != TokenKind::Comment)
            .collect();
        let mut lines = BTreeSet::new();
        let mut depth = 0i32;
        let mut parens = 0i32;
        let mut loop_bodies: Vec<i32> = Vec::new();
        // A loop header has been seen and its body brace is still to come
        let mut pending = false;

        for (i, tok) in tokens.iter().enumerate() {
            if tok.is_keyword("for") || tok.is_keyword("while") || tok.is_keyword("do") {
                pending = true;
                continue;
            }
            if tok.kind != TokenKind::Punct {
                continue;
            }
            match tok.text.as_str() {
                "(" => parens += 1,
                ")" => parens -= 1,
                "{" => {
                    depth += 1;
                    if pending && parens == 0 {
                        loop_bodies.push(depth);
                        pending = false;
                    }
                }
                "}" => {
                    if loop_bodies.last() == Some(&depth) {
                        loop_bodies.pop();
                    }
                    depth -= 1;
                }
                ";" if parens == 0 => pending = false,
                "+=" if !loop_bodies.is_empty() => {
                    if tokens.get(i + 1).is_some_and(|t| t.kind == TokenKind::Str) {
                        lines.insert(tok.line);
                    }
                }
                _ => {}
            }
        }
        lines
    }
}

impl Default for StringConcatLoopDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for StringConcatLoopDetector {
    fn name(&self) -> &'static str {
        "string-concat-loop"
    }

    fn description(&self) -> &'static str {
        "Detects string concatenation inside loops"
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::Performance
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self, language: &Language) -> bool {
        matches!(
            language,
            Language::Python | Language::JavaScript | Language::TypeScript | Language::Java
        )
    }

    fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>> {
        let lines = if *source.language() == Language::Python {
            self.python_lines(source)
        } else {
            self.brace_lines(source)
        };
        let hint = fix_hint(source.language());
        Ok(lines
            .into_iter()
            .map(|n| {
                self.finding(
                    n,
                    "String built with '+=' inside a loop; collect the parts and join them once",
                )
                .with_suggestion(hint)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(code: &str, lang: Language) -> Vec<u32> {
        StringConcatLoopDetector::new()
            .inspect(&SourceFile::new(code, lang))
            .unwrap()
            .iter()
            .map(|f| f.line)
            .collect()
    }

    #[test]
    fn test_python_loop() {
        let code = "out = ''\nfor w in words:\n    out += f'{w} '\nout += '!'\n";
        assert_eq!(lines(code, Language::Python), vec![3]);
    }

    #[test]
    fn test_python_numeric_accumulator_ok() {
        let code = "total = 0\nfor n in nums:\n    total += n\n";
        assert!(lines(code, Language::Python).is_empty());
    }

    #[test]
    fn test_javascript_loop() {
        let code = "let s = '';\nfor (const x of xs) {\n  s += `${x},`;\n}\ns += 'done';\n";
        assert_eq!(lines(code, Language::JavaScript), vec![3]);
    }

    #[test]
    fn test_java_while_loop() {
        let code = "String s = \"\";\nwhile (i < n) {\n  if (ok) {\n    s += \"x\";\n  }\n  i++;\n}\n";
        assert_eq!(lines(code, Language::Java), vec![4]);
    }
}
