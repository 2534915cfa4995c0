//! Command Injection Detector
//!
//! Shell execution with a command string that is not a constant:
//! - Python: `os.system`/`os.popen` with a non-literal argument, and any
//!   `subprocess.*` call with `shell=True`
//! - Node.js: `child_process` `exec`/`execSync` with a template literal or
//!   string concatenation
//!
//! `RegExp.prototype.exec` is not matched: the JavaScript check requires the
//! file to use `child_process`.
//!
//! CWE-78: OS Command Injection

use crate::detectors::base::Detector;
use crate::detectors::python;
use crate::models::{DetectorClass, Finding, Language, MetricCategory, Severity};
use crate::normalizer::SourceFile;
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

static OS_SHELL: OnceLock<Regex> = OnceLock::new();
static LITERAL_ARG: OnceLock<Regex> = OnceLock::new();
static SUBPROCESS: OnceLock<Regex> = OnceLock::new();
static SHELL_TRUE: OnceLock<Regex> = OnceLock::new();
static NODE_EXEC: OnceLock<Regex> = OnceLock::new();

fn os_shell() -> &'static Regex {
    OS_SHELL.get_or_init(|| Regex::new(r"\bos\.(system|popen)\s*\(").expect("valid regex"))
}

/// A single plain string literal as the whole argument (masked view)
fn literal_arg() -> &'static Regex {
    LITERAL_ARG.get_or_init(|| Regex::new(r#"^\s*["'] *["']\s*\)"#).expect("valid regex"))
}

fn subprocess() -> &'static Regex {
    SUBPROCESS.get_or_init(|| {
        Regex::new(r"\bsubprocess\.(run|call|Popen|check_output|check_call)\s*\(")
            .expect("valid regex")
    })
}

fn shell_true() -> &'static Regex {
    SHELL_TRUE.get_or_init(|| Regex::new(r"\bshell\s*=\s*True\b").expect("valid regex"))
}

fn node_exec() -> &'static Regex {
    NODE_EXEC.get_or_init(|| {
        Regex::new(r"(?:^|[^.\w$])(exec|execSync)\s*\(|\b(?:child_process|childProcess|cp)\.(exec|execSync)\s*\(")
            .expect("valid regex")
    })
}

pub struct CommandInjectionDetector;

impl CommandInjectionDetector {
    pub fn new() -> Self {
        Self
    }

    fn python_findings(&self, source: &SourceFile) -> Vec<Finding> {
        let mut findings = vec![];
        for stmt in python::statements(source) {
            let text: String = (stmt.start..=stmt.end)
                .filter_map(|n| source.code(n))
                .collect::<Vec<_>>()
                .join(" ");

            if let Some(m) = os_shell().captures(&text) {
                let call = m.get(0).map(|c| c.end()).unwrap_or(text.len());
                if !literal_arg().is_match(&text[call..]) {
                    let func = m.get(1).map(|f| f.as_str()).unwrap_or("system");
                    findings.push(
                        self.finding(
                            stmt.start,
                            format!(
                                "Shell command passed to os.{}() is built from dynamic input",
                                func
                            ),
                        )
                        .with_suggestion("Use subprocess.run() with an argument list instead of a shell string"),
                    );
                    continue;
                }
            }

            if subprocess().is_match(&text) && shell_true().is_match(&text) {
                findings.push(
                    self.finding(stmt.start, "subprocess call with shell=True runs its command through the shell")
                        .with_suggestion("Pass the command as an argument list and drop shell=True"),
                );
            }
        }
        findings
    }

    fn node_findings(&self, source: &SourceFile) -> Vec<Finding> {
        if !source.text().contains("child_process") {
            return vec![];
        }
        let mut findings = vec![];
        for (n, code) in source.code_lines() {
            let Some(caps) = node_exec().captures(code) else {
                continue;
            };
            let (Some(whole), Some(func)) = (caps.get(0), caps.get(1).or_else(|| caps.get(2))) else {
                continue;
            };
            let raw = source.line(n).unwrap_or("");
            let args = raw.get(whole.end()..).unwrap_or("");
            if args.contains("${") || args.contains('+') {
                findings.push(
                    self.finding(
                        n,
                        format!(
                            "Shell command passed to {}() is built from dynamic input",
                            func.as_str()
                        ),
                    )
                    .with_suggestion("Use execFile() or spawn() with an argument array"),
                );
            }
        }
        findings
    }
}

impl Default for CommandInjectionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for CommandInjectionDetector {
    fn name(&self) -> &'static str {
        "command-injection"
    }

    fn description(&self) -> &'static str {
        "Detects command injection vulnerabilities"
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
        if *source.language() == Language::Python {
            Ok(self.python_findings(source))
        } else {
            Ok(self.node_findings(source))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(code: &str, lang: Language) -> Vec<u32> {
        CommandInjectionDetector::new()
            .inspect(&SourceFile::new(code, lang))
            .unwrap()
            .iter()
            .map(|f| f.line)
            .collect()
    }

    #[test]
    fn test_python_os_system() {
        let code = "import os\nos.system('ls -l')\nos.system('rm ' + path)\nos.popen(f'cat {name}')\n";
        assert_eq!(lines(code, Language::Python), vec![3, 4]);
    }

    #[test]
    fn test_python_shell_true_multiline() {
        let code = "subprocess.run(\n    cmd,\n    shell=True,\n)\nsubprocess.run(['ls', '-l'])\n";
        assert_eq!(lines(code, Language::Python), vec![1]);
    }

    #[test]
    fn test_node_exec() {
        let code = "const { exec } = require('child_process');\nexec(`ls ${dir}`);\nexec('ls');\n/a/.exec(s + 'x');\n";
        assert_eq!(lines(code, Language::JavaScript), vec![2]);
    }

    #[test]
    fn test_regexp_exec_without_child_process() {
        assert!(lines("exec(a + b);\n", Language::JavaScript).is_empty());
    }
}
