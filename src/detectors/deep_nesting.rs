//! Deep Nesting Detector
//!
//! Reports each run of consecutive code lines nested deeper than the limit
//! once, at its first line. Blank and comment-only lines do not break a run.

use crate::detectors::base::Detector;
use crate::models::{Finding, MetricCategory, Severity};
use crate::normalizer::SourceFile;
use anyhow::Result;

pub struct DeepNestingDetector {
    threshold: u32,
}

impl DeepNestingDetector {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    fn report(&self, start: u32, end: u32, depth: u32) -> Finding {
        self.finding(
            start,
            format!(
                "Nesting depth {} exceeds the limit of {}; extract nested logic or use early returns",
                depth, self.threshold
            ),
        )
        .with_line_end(end)
    }
}

impl Default for DeepNestingDetector {
    fn default() -> Self {
        Self::new(4)
    }
}

impl Detector for DeepNestingDetector {
    fn name(&self) -> &'static str {
        "deep-nesting"
    }

    fn description(&self) -> &'static str {
        "Detects excessive nesting depth"
    }

    fn category(&self) -> MetricCategory {
        MetricCategory::Readability
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn inspect(&self, source: &SourceFile) -> Result<Vec<Finding>> {
        let mut findings = vec![];
        // (first line, last line, deepest level)
        let mut run: Option<(u32, u32, u32)> = None;

        for n in 1..=source.line_count() as u32 {
            if !source.is_code_line(n) {
                continue;
            }
            let depth = source.nesting(n);
            if depth > self.threshold {
                run = Some(match run {
                    Some((start, _, deepest)) => (start, n, deepest.max(depth)),
                    None => (n, n, depth),
                });
            } else if let Some((start, end, deepest)) = run.take() {
                findings.push(self.report(start, end, deepest));
            }
        }
        if let Some((start, end, deepest)) = run {
            findings.push(self.report(start, end, deepest));
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;

    #[test]
    fn test_brace_language_run() {
        let code = "function f() {\n  if (a) {\n    if (b) {\n      g();\n\n      h();\n    }\n  }\n}\n";
        let src = SourceFile::new(code, Language::JavaScript);
        let findings = DeepNestingDetector::new(2).inspect(&src).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 4);
        assert_eq!(findings[0].line_end, Some(6));
        assert!(findings[0].message.starts_with("Nesting depth 3"));
    }

    #[test]
    fn test_python_within_limit() {
        let code = "def f(x):\n    if x:\n        return 1\n    return 0\n";
        let src = SourceFile::new(code, Language::Python);
        assert!(DeepNestingDetector::new(4).inspect(&src).unwrap().is_empty());
    }

    #[test]
    fn test_python_two_runs() {
        let code = "for a in b:\n    for c in d:\n        x()\n    y()\n    for e in f:\n        z()\n";
        let src = SourceFile::new(code, Language::Python);
        let lines: Vec<u32> = DeepNestingDetector::new(1)
            .inspect(&src)
            .unwrap()
            .iter()
            .map(|f| f.line)
            .collect();
        assert_eq!(lines, vec![3, 6]);
    }
}
