//! Per-language lexers
//!
//! Three lexer families cover every supported language:
//! - hash-comment (Python): `#` comments, prefixed and triple-quoted strings
//! - C-family (JS/TS, Java, C, C++, C#, Go, Rust): `//` and `/* */` comments
//! - generic: whitespace-separated words, used in degraded mode
//!
//! Tokens are produced lazily; nothing is buffered beyond the current token.

use crate::models::Language;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Ident,
    Keyword,
    Number,
    Str,
    Comment,
    Punct,
}

/// A lexical token with the line it starts on (1-based) and its
/// character column (0-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub col: usize,
}

impl Token {
    /// Last line this token touches (multi-line strings and block comments)
    pub fn end_line(&self) -> u32 {
        self.line + self.text.matches('\n').count() as u32
    }

    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == text
    }

    pub fn is_keyword(&self, text: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Hash,
    CFamily,
    Generic,
}

/// Longest operators first so `===` wins over `==`
const OPERATORS: &[&str] = &[
    "===", "!==", "**=", "//=", ">>=", "<<=", "...", "->", "=>", "==", "!=", "<=", ">=", "&&",
    "||", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "::", ":=", "<<", ">>",
    "**", "//", "??",
];

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

const JS_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "export", "extends", "false", "finally", "for", "function",
    "if", "import", "in", "instanceof", "interface", "let", "new", "null", "return", "super",
    "switch", "this", "throw", "true", "try", "type", "typeof", "undefined", "var", "void",
    "while", "with", "yield",
];

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "boolean", "break", "byte", "case", "catch", "char", "class", "continue",
    "default", "do", "double", "else", "enum", "extends", "false", "final", "finally", "float",
    "for", "if", "implements", "import", "instanceof", "int", "interface", "long", "new", "null",
    "package", "private", "protected", "public", "return", "short", "static", "super", "switch",
    "synchronized", "this", "throw", "throws", "true", "try", "void", "volatile", "while",
];

const C_KEYWORDS: &[&str] = &[
    "auto", "bool", "break", "case", "catch", "char", "class", "const", "continue", "default",
    "delete", "do", "double", "else", "enum", "extern", "false", "float", "for", "goto", "if",
    "inline", "int", "long", "namespace", "new", "nullptr", "private", "protected", "public",
    "return", "short", "signed", "sizeof", "static", "struct", "switch", "template", "this",
    "throw", "true", "try", "typedef", "union", "unsigned", "using", "virtual", "void",
    "volatile", "while",
];

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while",
];

const GO_KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range", "return",
    "select", "struct", "switch", "type", "var",
];

const CSHARP_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "base", "bool", "break", "case", "catch", "class",
    "const", "continue", "default", "do", "else", "enum", "false", "finally", "for", "foreach",
    "if", "in", "int", "interface", "is", "namespace", "new", "null", "override", "private",
    "protected", "public", "return", "static", "string", "struct", "switch", "this", "throw",
    "true", "try", "using", "var", "virtual", "void", "while",
];

/// Lexer configuration for one language
#[derive(Debug, Clone, Copy)]
pub struct Lexer {
    family: Family,
    single_quote_strings: bool,
    backtick_strings: bool,
    dollar_idents: bool,
    keywords: &'static [&'static str],
}

impl Lexer {
    pub fn for_language(language: &Language) -> Self {
        let c_family = |single_quote_strings, backtick_strings, keywords| Lexer {
            family: Family::CFamily,
            single_quote_strings,
            backtick_strings,
            dollar_idents: false,
            keywords,
        };
        match language {
            Language::Python => Lexer {
                family: Family::Hash,
                single_quote_strings: true,
                backtick_strings: false,
                dollar_idents: false,
                keywords: PYTHON_KEYWORDS,
            },
            Language::JavaScript | Language::TypeScript => Lexer {
                dollar_idents: true,
                ..c_family(true, true, JS_KEYWORDS)
            },
            Language::Java => c_family(false, false, JAVA_KEYWORDS),
            Language::C | Language::Cpp => c_family(false, false, C_KEYWORDS),
            Language::Rust => c_family(false, false, RUST_KEYWORDS),
            Language::Go => c_family(false, true, GO_KEYWORDS),
            Language::CSharp => c_family(false, false, CSHARP_KEYWORDS),
            Language::Unsupported(_) => Lexer {
                family: Family::Generic,
                single_quote_strings: false,
                backtick_strings: false,
                dollar_idents: false,
                keywords: &[],
            },
        }
    }

    /// Whitespace tokenization (no language knowledge)
    pub fn is_generic(&self) -> bool {
        self.family == Family::Generic
    }

    /// Indentation-structured language (nesting from indentation, not braces)
    pub fn is_indentation_based(&self) -> bool {
        self.family != Family::CFamily
    }

    pub fn tokens<'a>(&self, src: &'a str) -> Tokens<'a> {
        Tokens {
            src,
            pos: 0,
            line: 1,
            col: 0,
            lexer: *self,
        }
    }
}

/// Lazy token stream over `\n`-normalized text
pub struct Tokens<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
    col: usize,
    lexer: Lexer,
}

impl<'a> Tokens<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            if self.bump().is_none() {
                break;
            }
        }
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    fn eat_until_newline(&mut self) {
        self.eat_while(|c| c != '\n');
    }

    fn eat_block_comment(&mut self) {
        self.bump_n(2);
        while !self.rest().is_empty() {
            if self.rest().starts_with("*/") {
                self.bump_n(2);
                return;
            }
            self.bump();
        }
    }

    /// Opening quote already consumed. Unterminated single-line strings
    /// stop at the end of the line.
    fn eat_quoted(&mut self, quote: char, multiline: bool) {
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.bump_n(2);
                continue;
            }
            if c == '\n' && !multiline {
                return;
            }
            self.bump();
            if c == quote {
                return;
            }
        }
    }

    fn eat_triple_quoted(&mut self, quote: char) {
        let close: String = std::iter::repeat(quote).take(3).collect();
        self.bump_n(3);
        while !self.rest().is_empty() {
            if self.rest().starts_with('\\') {
                self.bump_n(2);
                continue;
            }
            if self.rest().starts_with(close.as_str()) {
                self.bump_n(3);
                return;
            }
            self.bump();
        }
    }

    fn is_quote(&self, c: char) -> bool {
        c == '"'
            || (c == '\'' && self.lexer.single_quote_strings)
            || (c == '`' && self.lexer.backtick_strings)
    }

    fn eat_string(&mut self) {
        let Some(quote) = self.peek() else { return };
        let triple: String = std::iter::repeat(quote).take(3).collect();
        if self.lexer.family == Family::Hash && self.rest().starts_with(triple.as_str()) {
            self.eat_triple_quoted(quote);
        } else {
            self.bump();
            self.eat_quoted(quote, quote == '`');
        }
    }

    /// Length in chars of a C-style char literal at the cursor, if one is
    /// there. A lone `'` (Rust lifetimes, labels) is not a literal.
    fn char_literal_len(&self) -> Option<usize> {
        let mut chars = self.rest().chars().skip(1);
        match chars.next()? {
            '\\' => {
                chars.next()?;
                for (i, c) in chars.take(10).enumerate() {
                    match c {
                        '\'' => return Some(i + 4),
                        '\n' => return None,
                        _ => {}
                    }
                }
                None
            }
            '\n' | '\'' => None,
            _ => (chars.next()? == '\'').then_some(3),
        }
    }

    fn is_ident_char(&self, c: char) -> bool {
        c.is_alphanumeric() || c == '_' || (c == '$' && self.lexer.dollar_idents)
    }

    fn scan_generic(&mut self) -> TokenKind {
        let start = self.pos;
        self.eat_while(|c| !c.is_whitespace());
        let first = self.src[start..].chars().next().unwrap_or(' ');
        if first.is_ascii_digit() {
            TokenKind::Number
        } else if first.is_alphabetic() || first == '_' {
            TokenKind::Ident
        } else {
            TokenKind::Punct
        }
    }

    fn scan(&mut self, c: char) -> TokenKind {
        let family = self.lexer.family;
        if family == Family::Generic {
            return self.scan_generic();
        }

        if family == Family::Hash && c == '#' {
            self.eat_until_newline();
            return TokenKind::Comment;
        }
        if family == Family::CFamily && self.rest().starts_with("//") {
            self.eat_until_newline();
            return TokenKind::Comment;
        }
        if family == Family::CFamily && self.rest().starts_with("/*") {
            self.eat_block_comment();
            return TokenKind::Comment;
        }

        if self.is_quote(c) {
            self.eat_string();
            return TokenKind::Str;
        }
        if c == '\'' {
            return match self.char_literal_len() {
                Some(len) => {
                    self.bump_n(len);
                    TokenKind::Str
                }
                None => {
                    self.bump();
                    TokenKind::Punct
                }
            };
        }

        if c.is_ascii_digit() || (c == '.' && self.peek_nth(1).is_some_and(|d| d.is_ascii_digit()))
        {
            self.eat_while(|c| c.is_alphanumeric() || c == '_' || c == '.');
            return TokenKind::Number;
        }

        if self.is_ident_char(c) {
            let start = self.pos;
            while let Some(c) = self.peek() {
                if !self.is_ident_char(c) {
                    break;
                }
                self.bump();
            }
            let word = &self.src[start..self.pos];
            if family == Family::Hash
                && is_string_prefix(word)
                && self.peek().is_some_and(|q| q == '"' || q == '\'')
            {
                self.eat_string();
                return TokenKind::Str;
            }
            return if self.lexer.keywords.contains(&word) {
                TokenKind::Keyword
            } else {
                TokenKind::Ident
            };
        }

        if let Some(op) = OPERATORS.iter().find(|op| self.rest().starts_with(**op)) {
            self.bump_n(op.len());
        } else {
            self.bump();
        }
        TokenKind::Punct
    }
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.eat_while(char::is_whitespace);
        let c = self.peek()?;
        let (start, line, col) = (self.pos, self.line, self.col);
        let kind = self.scan(c);
        Some(Token {
            kind,
            text: self.src[start..self.pos].to_string(),
            line,
            col,
        })
    }
}

/// Python string prefixes (`r"..."`, `f'...'`, `rb"..."`)
fn is_string_prefix(word: &str) -> bool {
    word.len() <= 2
        && word
            .chars()
            .all(|c| matches!(c.to_ascii_lowercase(), 'r' | 'b' | 'f' | 'u'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str, lang: Language) -> Vec<Token> {
        Lexer::for_language(&lang).tokens(src).collect()
    }

    fn kinds(src: &str, lang: Language) -> Vec<(TokenKind, String)> {
        lex(src, lang).into_iter().map(|t| (t.kind, t.text)).collect()
    }

    #[test]
    fn test_python_tokens() {
        let toks = kinds("def f(x):  # hi\n    return x+1\n", Language::Python);
        assert_eq!(toks[0], (TokenKind::Keyword, "def".to_string()));
        assert_eq!(toks[1], (TokenKind::Ident, "f".to_string()));
        assert!(toks.contains(&(TokenKind::Comment, "# hi".to_string())));
        assert!(toks.contains(&(TokenKind::Number, "1".to_string())));
    }

    #[test]
    fn test_python_triple_quoted_string_spans_lines() {
        let toks = lex("x = \"\"\"a\n# not a comment\nb\"\"\"\ny = 1\n", Language::Python);
        let s = toks.iter().find(|t| t.kind == TokenKind::Str).unwrap();
        assert_eq!(s.line, 1);
        assert_eq!(s.end_line(), 3);
        assert!(!toks.iter().any(|t| t.kind == TokenKind::Comment));
        let y = toks.iter().find(|t| t.text == "y").unwrap();
        assert_eq!(y.line, 4);
    }

    #[test]
    fn test_python_prefixed_string() {
        let toks = kinds("s = f'{a}' + rb\"x\"", Language::Python);
        assert!(toks.contains(&(TokenKind::Str, "f'{a}'".to_string())));
        assert!(toks.contains(&(TokenKind::Str, "rb\"x\"".to_string())));
    }

    #[test]
    fn test_c_family_comments() {
        let toks = kinds("int a = 1; // one\n/* two\nlines */ int b;", Language::C);
        let comments: Vec<_> = toks
            .iter()
            .filter(|(k, _)| *k == TokenKind::Comment)
            .collect();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[1].1, "/* two\nlines */");
    }

    #[test]
    fn test_js_operators_and_templates() {
        let toks = kinds("if (a === b) { s = `x ${y}\nz`; }", Language::JavaScript);
        assert!(toks.contains(&(TokenKind::Punct, "===".to_string())));
        assert!(toks.contains(&(TokenKind::Str, "`x ${y}\nz`".to_string())));
    }

    #[test]
    fn test_rust_lifetime_is_not_char_literal() {
        let toks = kinds("fn f<'a>(x: &'a str) -> char { 'z' }", Language::Rust);
        assert!(toks.contains(&(TokenKind::Str, "'z'".to_string())));
        assert!(toks.contains(&(TokenKind::Punct, "'".to_string())));
    }

    #[test]
    fn test_char_literal_escape() {
        let toks = kinds("char c = '\\n';", Language::C);
        assert!(toks.contains(&(TokenKind::Str, "'\\n'".to_string())));
    }

    #[test]
    fn test_generic_whitespace_tokens() {
        let toks = kinds("PERFORM X-1 UNTIL 10", Language::parse("COBOL"));
        assert_eq!(toks.len(), 4);
        assert_eq!(toks[3].0, TokenKind::Number);
    }

    #[test]
    fn test_token_columns() {
        let toks = lex("a  = 1\n  b", Language::Python);
        let b = toks.last().unwrap();
        assert_eq!((b.line, b.col), (2, 2));
        assert_eq!(toks[1].col, 3);
    }

    #[test]
    fn test_empty_source_has_no_tokens() {
        assert!(lex("", Language::Python).is_empty());
    }
}
