//! Rule detectors
//!
//! This module provides the detector framework and the rule catalogue run
//! against each submission.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     DetectorEngine                          │
//! │  - Registers the selected detectors                         │
//! │  - Runs them in parallel (rayon) under a deadline           │
//! │  - Merges, suppresses and orders findings                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Detector Trait                         │
//! │  - name(): Stable rule ID                                   │
//! │  - class()/category()/severity(): Rule metadata             │
//! │  - applies_to(language): Language filter                    │
//! │  - inspect(source): Run detection, return findings          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Detector Classes
//!
//! ## Syntax (run for every review type except security-only)
//! - `SyntaxErrorDetector` - tree-sitter recovery points
//! - `UnbalancedDelimitersDetector` - unclosed or mismatched brackets
//! - `TabIndentationDetector` - tab-indented lines
//!
//! ## Security
//! - `EvalDetector`, `SecretDetector`, `CommandInjectionDetector`,
//!   `UnsafeCFunctionDetector`
//!
//! ## Quality
//! - Layout: `TrailingWhitespaceDetector`, `LongLineDetector`,
//!   `DeepNestingDetector`, `TodoScanner`
//! - Python: `UnboundVariableDetector`, `PreferComprehensionDetector`,
//!   `MissingTypeHintsDetector`, `MutableDefaultArgsDetector`,
//!   `BareExceptDetector`
//! - Others: `LooseEqualityDetector`, `VarDeclarationDetector`,
//!   `StringConcatLoopDetector`, `EmptyCatchDetector`
//!
//! # Usage
//!
//! ```ignore
//! use critique::detectors::{select_detectors, DetectorEngine};
//!
//! let mut engine = DetectorEngine::new(config.workers);
//! engine.register_all(select_detectors(&config, &language, review_type));
//! let run = engine.run(source, deadline, &cancel)?;
//! ```

mod base;
mod engine;
pub mod python;

// Syntax detectors
mod syntax_error;
mod tab_indentation;
mod unbalanced_delimiters;

// Layout and general quality detectors
mod deep_nesting;
mod long_line;
mod todo_scanner;
mod trailing_whitespace;

// Python detectors
mod broad_exception;
mod comprehension;
mod mutable_default_args;
mod type_hints;
mod unbound_variable;

// Language-specific quality detectors
mod empty_catch;
mod implicit_coercion;
mod string_concat_loop;
mod var_declaration;

// Security detectors
mod command_injection;
mod eval_detector;
mod secrets;
mod unsafe_c_function;

pub use base::{DetectionSummary, Detector, DetectorResult};
pub use engine::{is_suppressed, DetectorEngine, EngineRun, SUPPRESS_MARKER};

pub use broad_exception::BareExceptDetector;
pub use command_injection::CommandInjectionDetector;
pub use comprehension::PreferComprehensionDetector;
pub use deep_nesting::DeepNestingDetector;
pub use empty_catch::EmptyCatchDetector;
pub use eval_detector::EvalDetector;
pub use implicit_coercion::LooseEqualityDetector;
pub use long_line::LongLineDetector;
pub use mutable_default_args::MutableDefaultArgsDetector;
pub use secrets::SecretDetector;
pub use string_concat_loop::StringConcatLoopDetector;
pub use syntax_error::SyntaxErrorDetector;
pub use tab_indentation::TabIndentationDetector;
pub use todo_scanner::TodoScanner;
pub use trailing_whitespace::TrailingWhitespaceDetector;
pub use type_hints::MissingTypeHintsDetector;
pub use unbalanced_delimiters::UnbalancedDelimitersDetector;
pub use unbound_variable::UnboundVariableDetector;
pub use unsafe_c_function::UnsafeCFunctionDetector;
pub use var_declaration::VarDeclarationDetector;

use crate::config::{DetectorSelection, ReviewConfig};
use crate::models::{DetectorClass, Language, ReviewType};
use std::sync::Arc;

/// Create the full rule catalogue, with thresholds taken from `config`
pub fn default_detectors(config: &ReviewConfig) -> Vec<Arc<dyn Detector>> {
    let thresholds = &config.thresholds;
    vec![
        // Syntax
        Arc::new(SyntaxErrorDetector::new()),
        Arc::new(UnbalancedDelimitersDetector::new()),
        Arc::new(TabIndentationDetector::new()),
        // Layout
        Arc::new(TrailingWhitespaceDetector::new()),
        Arc::new(LongLineDetector::new(thresholds.max_line_length)),
        Arc::new(DeepNestingDetector::new(thresholds.max_nesting)),
        Arc::new(TodoScanner::new()),
        // Python
        Arc::new(UnboundVariableDetector::new()),
        Arc::new(PreferComprehensionDetector::new(thresholds.max_line_length)),
        Arc::new(MissingTypeHintsDetector::new(thresholds.min_function_lines)),
        Arc::new(MutableDefaultArgsDetector::new()),
        Arc::new(BareExceptDetector::new()),
        // Other languages
        Arc::new(LooseEqualityDetector::new()),
        Arc::new(VarDeclarationDetector::new()),
        Arc::new(StringConcatLoopDetector::new()),
        Arc::new(EmptyCatchDetector::new()),
        // Security
        Arc::new(EvalDetector::new()),
        Arc::new(SecretDetector::new()),
        Arc::new(CommandInjectionDetector::new()),
        Arc::new(UnsafeCFunctionDetector::new()),
    ]
}

/// Detectors to run for one submission: the catalogue narrowed by the
/// effective selection, the language and the disabled rules
pub fn select_detectors(
    config: &ReviewConfig,
    language: &Language,
    review_type: ReviewType,
) -> Vec<Arc<dyn Detector>> {
    let selection = config.enabled_detectors.effective(review_type);
    default_detectors(config)
        .into_iter()
        .filter(|d| match selection {
            DetectorSelection::All => true,
            DetectorSelection::Syntax => d.class() == DetectorClass::Syntax,
            DetectorSelection::Security => d.class() == DetectorClass::Security,
        })
        .filter(|d| d.applies_to(language))
        .filter(|d| config.is_rule_enabled(d.name()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn names(detectors: &[Arc<dyn Detector>]) -> Vec<&'static str> {
        detectors.iter().map(|d| d.name()).collect()
    }

    #[test]
    fn test_rule_ids_are_unique() {
        let all = default_detectors(&ReviewConfig::default());
        let unique: HashSet<_> = names(&all).into_iter().collect();
        assert_eq!(unique.len(), all.len());
        assert_eq!(all.len(), 20);
    }

    #[test]
    fn test_quick_syntax_selects_syntax_class() {
        let selected = select_detectors(
            &ReviewConfig::default(),
            &Language::Python,
            ReviewType::QuickSyntax,
        );
        assert_eq!(
            names(&selected),
            vec!["syntax-error", "unbalanced-delimiters", "tab-indentation"]
        );
    }

    #[test]
    fn test_security_only_for_c() {
        let selected = select_detectors(
            &ReviewConfig::default(),
            &Language::C,
            ReviewType::SecurityOnly,
        );
        assert_eq!(names(&selected), vec!["hardcoded-secret", "unsafe-c-function"]);
    }

    #[test]
    fn test_unsupported_language_gets_agnostic_rules_only() {
        let selected = select_detectors(
            &ReviewConfig::default(),
            &Language::parse("COBOL"),
            ReviewType::Full,
        );
        let selected = names(&selected);
        assert!(selected.contains(&"long-line"));
        assert!(!selected.contains(&"syntax-error"));
        assert!(!selected.iter().any(|n| n.starts_with("py-")));
    }

    #[test]
    fn test_disabled_rules_are_skipped() {
        let config = ReviewConfig::default().disable_rule("todo-comment");
        let selected = select_detectors(&config, &Language::Python, ReviewType::Full);
        assert!(!names(&selected).contains(&"todo-comment"));
    }

    #[test]
    fn test_configured_selection_applies_to_full_reviews() {
        let config = ReviewConfig::default().with_selection(DetectorSelection::Security);
        let selected = select_detectors(&config, &Language::Python, ReviewType::Full);
        assert!(selected.iter().all(|d| d.class() == DetectorClass::Security));
    }
}
