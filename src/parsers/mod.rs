//! Syntax front-end using tree-sitter
//!
//! Maps each supported language to its grammar and reports the places where
//! the parser had to recover (ERROR nodes) or invent tokens (MISSING nodes).

use crate::models::Language;
use anyhow::{Context, Result};
use tree_sitter::{Node, Parser, Tree};

/// Longest snippet quoted in a syntax error message
const SNIPPET_LIMIT: usize = 24;

/// Grammar for a language, if one is registered
pub fn grammar(language: &Language) -> Option<tree_sitter::Language> {
    let lang = match language {
        Language::Python => tree_sitter_python::LANGUAGE.into(),
        Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Language::Java => tree_sitter_java::LANGUAGE.into(),
        Language::C => tree_sitter_c::LANGUAGE.into(),
        Language::Cpp => tree_sitter_cpp::LANGUAGE.into(),
        Language::Rust => tree_sitter_rust::LANGUAGE.into(),
        Language::Go => tree_sitter_go::LANGUAGE.into(),
        Language::CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
        Language::Unsupported(_) => return None,
    };
    Some(lang)
}

/// Parse source text. Returns `Ok(None)` for languages without a grammar.
pub fn parse(source: &str, language: &Language) -> Result<Option<Tree>> {
    let Some(grammar) = grammar(language) else {
        return Ok(None);
    };
    let mut parser = Parser::new();
    parser
        .set_language(&grammar)
        .with_context(|| format!("Failed to set {} language", language))?;
    let tree = parser
        .parse(source, None)
        .with_context(|| format!("Failed to parse {} source", language))?;
    Ok(Some(tree))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxIssueKind {
    /// Text the grammar could not place
    Unexpected(String),
    /// A token the parser had to assume (e.g. a closing `)`)
    Missing(String),
}

/// One recovery point reported by the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    /// 1-based line
    pub line: u32,
    pub kind: SyntaxIssueKind,
}

impl SyntaxIssue {
    pub fn message(&self) -> String {
        match &self.kind {
            SyntaxIssueKind::Unexpected(snippet) if snippet.is_empty() => {
                "Syntax error: the parser could not make sense of this line".to_string()
            }
            SyntaxIssueKind::Unexpected(snippet) => {
                format!("Syntax error near `{}`", snippet)
            }
            SyntaxIssueKind::Missing(kind) => format!("Syntax error: missing `{}`", kind),
        }
    }
}

/// All recovery points, sorted by line, at most one per line
pub fn syntax_issues(source: &str, language: &Language) -> Result<Vec<SyntaxIssue>> {
    let Some(tree) = parse(source, language)? else {
        return Ok(Vec::new());
    };

    let mut issues = Vec::new();
    let mut stack: Vec<Node> = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        let line = node.start_position().row as u32 + 1;
        if node.is_missing() {
            issues.push(SyntaxIssue {
                line,
                kind: SyntaxIssueKind::Missing(node.kind().to_string()),
            });
            continue;
        }
        if node.is_error() {
            issues.push(SyntaxIssue {
                line,
                kind: SyntaxIssueKind::Unexpected(snippet(&node, source)),
            });
            continue;
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }

    issues.sort_by_key(|i| i.line);
    issues.dedup_by_key(|i| i.line);
    Ok(issues)
}

/// True when the source parses without ERROR or MISSING nodes. Languages
/// without a grammar are always considered well-formed.
pub fn is_well_formed(source: &str, language: &Language) -> bool {
    match parse(source, language) {
        Ok(Some(tree)) => !tree.root_node().has_error(),
        Ok(None) => true,
        Err(_) => false,
    }
}

fn snippet(node: &Node, source: &str) -> String {
    let text = node
        .utf8_text(source.as_bytes())
        .unwrap_or("")
        .lines()
        .next()
        .unwrap_or("")
        .trim();
    text.chars().take(SNIPPET_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_supported_language_has_grammar() {
        for lang in Language::SUPPORTED {
            assert!(grammar(&lang).is_some(), "no grammar for {}", lang);
        }
        assert!(grammar(&Language::parse("COBOL")).is_none());
    }

    #[test]
    fn test_valid_python() {
        let src = "def f(x):\n    return x + 1\n";
        assert!(is_well_formed(src, &Language::Python));
        assert!(syntax_issues(src, &Language::Python).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_python_reports_line() {
        let src = "x = 1\ndef f(:\n    return 2\n";
        assert!(!is_well_formed(src, &Language::Python));
        let issues = syntax_issues(src, &Language::Python).unwrap();
        assert!(!issues.is_empty());
        assert!(issues.iter().all(|i| i.line >= 1 && i.line <= 3));
    }

    #[test]
    fn test_invalid_javascript() {
        let src = "function f( {\n  return 1;\n}\n";
        assert!(!is_well_formed(src, &Language::JavaScript));
    }

    #[test]
    fn test_unsupported_language_has_no_issues() {
        let lang = Language::parse("COBOL");
        assert!(is_well_formed("((((", &lang));
        assert!(syntax_issues("((((", &lang).unwrap().is_empty());
    }
}
