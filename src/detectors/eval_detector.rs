//! Eval/exec code execution detector
//!
//! Detects dynamic code execution that can lead to code injection:
//!
//! - Python: `eval()` and `exec()`
//! - JavaScript/TypeScript: `eval()` and `new Function(...)`
//!
//! Method calls such as `model.eval()` and definitions named `eval` are not
//! reported.
//!
//! CWE-94: Code Injection

use crate::detectors::base::Detector;
use crate::models::{DetectorClass, Finding, Language, MetricCategory, Severity};
use crate::normalizer::{SourceFile, Token, TokenKind};
use anyhow::Result;

/// Dangerous code execution functions per language
fn code_exec_functions(language: &Language) -> &'static [&'static str] {
    match language {
        Language::Python => &["eval", "exec"],
        _ => &["eval"],
    }
}

pub struct EvalDetector;

impl EvalDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EvalDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for EvalDetector {
    fn name(&self) -> &'static str {
        "eval-usage"
    }

    fn description(&self) -> &'static str {
        "Detects eval/exec and other dynamic code execution"
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
        *language == Language::Python || language.is_js_like()
    }

    fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>> {
        let tokens: Vec<Token> = source
            .tokens()
            .filter(|t| t.kind != TokenKind::Comment)
            .collect();
        let functions = code_exec_functions(source.language());
        let js = source.language().is_js_like();

        let mut findings = vec![];
        for (i, tok) in tokens.iter().enumerate() {
            let prev = i.checked_sub(1).and_then(|p| tokens.get(p));
            let calls = tokens.get(i + 1).is_some_and(|t| t.is_punct("("));

            if tok.kind == TokenKind::Ident && functions.contains(&tok.text.as_str()) && calls {
                // `obj.eval()`, `def eval(` and `function eval(` are not dynamic execution
                let excluded = prev.is_some_and(|p| {
                    p.is_punct(".") || p.is_keyword("def") || p.is_keyword("function")
                });
                if !excluded {
                    findings.push(self.finding(
                        tok.line,
                        format!(
                            "Avoid {}(): executing dynamically built code is a code injection risk",
                            tok.text
                        ),
                    ));
                }
            } else if js && tok.text == "Function" && prev.is_some_and(|p| p.is_keyword("new")) {
                findings.push(self.finding(
                    tok.line,
                    "Avoid new Function(): it compiles strings into code like eval()",
                ));
            }
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(code: &str, lang: Language) -> Vec<u32> {
        EvalDetector::new()
            .inspect(&SourceFile::new(code, lang))
            .unwrap()
            .iter()
            .map(|f| f.line)
            .collect()
    }

    #[test]
    fn test_python_eval_exec() {
        let code = "x = eval(data)\nexec(code)\nmodel.eval()\ns = 'eval(x)'\n# eval(y)\n";
        assert_eq!(lines(code, Language::Python), vec![1, 2]);
    }

    #[test]
    fn test_python_definition_not_flagged() {
        assert!(lines("def eval(x):\n    return x\n", Language::Python).is_empty());
    }

    #[test]
    fn test_javascript() {
        let code = "eval(input);\nconst f = new Function('a', 'return a');\nre.exec(s);\n";
        assert_eq!(lines(code, Language::JavaScript), vec![1, 2]);
    }
}
