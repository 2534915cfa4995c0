//! Initialize a possibly-unbound variable
//!
//! Inserts `name = None` right before the compound statement that assigns
//! the name on only some paths, at that statement's indentation.

use crate::detectors::python;
use crate::fixes::base::{LineEdit, Patch};
use crate::models::Finding;
use crate::normalizer::SourceFile;

pub struct InitializeUnboundPatch;

impl Patch for InitializeUnboundPatch {
    fn rule_id(&self) -> &'static str {
        "py-unbound-variable"
    }

    fn patch(&self, source: &SourceFile, finding: &Finding) -> Option<LineEdit> {
        let symbol = finding.symbol.as_deref()?;
        let read = python::unbound_reads(source)
            .into_iter()
            .find(|r| r.line == finding.line && r.name == symbol)?;

        Some(LineEdit::insert_before(
            read.anchor,
            vec![format!("{}{} = None", read.indent, read.name)],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::{Detector, UnboundVariableDetector};
    use crate::models::Language;

    #[test]
    fn test_inserts_before_anchor() {
        let code = "def process(items):\n    if items:\n        result = len(items)\n    return result\n";
        let src = SourceFile::new(code, Language::Python);
        let finding = UnboundVariableDetector::new().inspect(&src).unwrap().remove(0);

        let edit = InitializeUnboundPatch.patch(&src, &finding).unwrap();
        assert_eq!(edit, LineEdit::insert_before(2, vec!["    result = None".to_string()]));
    }

    #[test]
    fn test_declines_without_symbol() {
        let code = "def process(items):\n    if items:\n        result = len(items)\n    return result\n";
        let src = SourceFile::new(code, Language::Python);
        let mut finding = UnboundVariableDetector::new().inspect(&src).unwrap().remove(0);
        finding.symbol = None;
        assert!(InitializeUnboundPatch.patch(&src, &finding).is_none());
    }
}
