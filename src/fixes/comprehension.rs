//! Rewrite an append loop as a list comprehension

use crate::detectors::python;
use crate::fixes::base::{LineEdit, Patch};
use crate::models::Finding;
use crate::normalizer::SourceFile;

pub struct ComprehensionPatch;

impl Patch for ComprehensionPatch {
    fn rule_id(&self) -> &'static str {
        "py-prefer-comprehension"
    }

    fn patch(&self, source: &SourceFile, finding: &Finding) -> Option<LineEdit> {
        let found = python::append_loops(source).into_iter().find(|lp| {
            lp.for_line == finding.line
                && finding.symbol.as_deref().map_or(true, |s| s == lp.list)
        })?;

        Some(LineEdit::replace_lines(
            found.init_line,
            found.end_line,
            vec![found.rewrite],
        ))
    }
}
