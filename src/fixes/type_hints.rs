//! Add inert `object` annotations to a function signature
//!
//! Only single-line `def` headers are rewritten. Every parameter that lacks
//! an annotation gets `: object`, and a missing return annotation becomes
//! `-> object`. Neither changes runtime behavior.

use crate::detectors::python;
use crate::fixes::base::{insert_at_chars, LineEdit, Patch};
use crate::models::Finding;
use crate::normalizer::SourceFile;

const PARAM_STUB: &str = ": object";
const RETURN_STUB: &str = " -> object";

pub struct TypeHintStubPatch;

impl Patch for TypeHintStubPatch {
    fn rule_id(&self) -> &'static str {
        "py-missing-type-hints"
    }

    fn patch(&self, source: &SourceFile, finding: &Finding) -> Option<LineEdit> {
        let func = python::functions(source).into_iter().find(|f| {
            f.def_line == finding.line && finding.symbol.as_deref().map_or(true, |s| s == f.name)
        })?;
        if !func.single_line_header() {
            return None;
        }

        let mut inserts: Vec<(usize, &str)> = func
            .unannotated_params()
            .map(|p| (p.name_end, PARAM_STUB))
            .collect();
        if !func.has_return_annotation {
            inserts.push((func.close_paren + 1, RETURN_STUB));
        }
        if inserts.is_empty() {
            return None;
        }

        let line = source.line(func.def_line)?;
        let rewritten = insert_at_chars(line, &inserts)?;
        Some(LineEdit::replace_line(func.def_line, rewritten))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::{Detector, MissingTypeHintsDetector};
    use crate::models::Language;

    fn patch_first(code: &str) -> Option<LineEdit> {
        let src = SourceFile::new(code, Language::Python);
        let finding = MissingTypeHintsDetector::new(1).inspect(&src).unwrap().remove(0);
        TypeHintStubPatch.patch(&src, &finding)
    }

    #[test]
    fn test_annotates_params_and_return() {
        let edit = patch_first("def scale(items, factor=2):\n    return [i * factor for i in items]\n")
            .unwrap();
        assert_eq!(
            edit.replacement,
            vec!["def scale(items: object, factor: object=2) -> object:".to_string()]
        );
    }

    #[test]
    fn test_skips_receiver_and_existing_hints() {
        let edit = patch_first(
            "class Job:\n    def run(self, n: int, *args, **kwargs) -> None:\n        pass\n",
        )
        .unwrap();
        assert_eq!(
            edit.replacement,
            vec!["    def run(self, n: int, *args: object, **kwargs: object) -> None:".to_string()]
        );
    }

    #[test]
    fn test_declines_multiline_header() {
        let code = "def f(\n    a,\n    b,\n):\n    return a + b\n";
        let src = SourceFile::new(code, Language::Python);
        let findings = MissingTypeHintsDetector::new(1).inspect(&src).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(!findings[0].auto_fixable);
        assert!(TypeHintStubPatch.patch(&src, &findings[0]).is_none());
    }
}
