//! Source normalizer
//!
//! Turns raw submitted text into the line map every later stage works on:
//! - `\r\n`, `\r` and `\n` all end a line; a trailing terminator does not add
//!   an empty line, and empty input has zero lines
//! - a lazy token stream per language (see [`tokenizer`])
//! - a masked "code view" of each line with string contents and comments
//!   blanked, so pattern detectors do not match inside literals
//! - structural statistics (see [`stats`])
//!
//! Languages without a lexer fall back to whitespace tokenization.

pub mod stats;
pub mod tokenizer;

pub use stats::{indent_width, StructuralStats, DEFAULT_LINE_LIMIT};
pub use tokenizer::{Lexer, Token, TokenKind, Tokens};

use crate::models::Language;
use serde::{Deserialize, Serialize};

/// Line terminator style of the original submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
    Cr,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::Cr => "\r",
        }
    }

    /// The first terminator found decides the style
    fn detect(raw: &str) -> Self {
        match raw.find(['\r', '\n']) {
            Some(i) if raw[i..].starts_with("\r\n") => LineEnding::CrLf,
            Some(i) if raw[i..].starts_with('\r') => LineEnding::Cr,
            _ => LineEnding::Lf,
        }
    }
}

/// Terminator of each line in `raw`. A final line with none gets `fallback`.
fn line_endings(raw: &str, fallback: LineEnding) -> Vec<LineEnding> {
    let bytes = raw.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                out.push(LineEnding::CrLf);
                i += 1;
            }
            b'\r' => out.push(LineEnding::Cr),
            b'\n' => out.push(LineEnding::Lf),
            _ => {}
        }
        i += 1;
    }
    if !raw.is_empty() && !raw.ends_with(['\r', '\n']) {
        out.push(fallback);
    }
    out
}

/// Per-line facts gathered during the token pass
#[derive(Debug, Clone, Default)]
pub(crate) struct LineInfo {
    pub has_code: bool,
    pub has_comment: bool,
    pub starts_in_string: bool,
    pub ends_in_string: bool,
    /// Open `{` before the first token on the line
    pub brace_depth: u32,
    /// Open `(` and `[` before the first token on the line
    pub bracket_depth: u32,
    pub opens_with_close_brace: bool,
}

/// A normalized submission
#[derive(Debug, Clone)]
pub struct SourceFile {
    raw: String,
    text: String,
    language: Language,
    lexer: Lexer,
    lines: Vec<String>,
    masked: Vec<String>,
    infos: Vec<LineInfo>,
    line_ending: LineEnding,
    endings: Vec<LineEnding>,
    trailing_newline: bool,
    tab_width: usize,
    stats: StructuralStats,
}

impl SourceFile {
    pub fn new(raw: &str, language: Language) -> Self {
        Self::with_line_limit(raw, language, DEFAULT_LINE_LIMIT)
    }

    pub fn with_line_limit(raw: &str, language: Language, max_line_length: usize) -> Self {
        let text = raw.replace("\r\n", "\n").replace('\r', "\n");
        let trailing_newline = text.ends_with('\n');
        let lines: Vec<String> = if text.is_empty() {
            Vec::new()
        } else {
            let body = text.strip_suffix('\n').unwrap_or(text.as_str());
            body.split('\n').map(str::to_string).collect()
        };

        let lexer = Lexer::for_language(&language);
        let (infos, masked) = scan_lines(&text, &lines, &lexer);
        let tab_width = tab_width(&language);

        let profile = if lexer.is_indentation_based() {
            stats::indentation_profile(&lines, &infos, tab_width)
        } else {
            stats::brace_profile(&lines, &infos)
        };
        let stats = stats::compute(&lines, &infos, profile, max_line_length);

        let line_ending = LineEnding::detect(raw);
        Self {
            raw: raw.to_string(),
            line_ending,
            endings: line_endings(raw, line_ending),
            text,
            language,
            lexer,
            lines,
            masked,
            infos,
            trailing_newline,
            tab_width,
            stats,
        }
    }

    /// The submission exactly as received
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The submission with every line terminator rewritten to `\n`
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// True when tokenization fell back to whitespace splitting
    pub fn degraded(&self) -> bool {
        self.lexer.is_generic()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line `n` (1-based)
    pub fn line(&self, n: u32) -> Option<&str> {
        self.index(n).map(|i| self.lines[i].as_str())
    }

    /// Line `n` (1-based) with string contents and comments blanked
    pub fn code(&self, n: u32) -> Option<&str> {
        self.index(n).map(|i| self.masked[i].as_str())
    }

    /// `(line number, masked line)` pairs
    pub fn code_lines(&self) -> impl Iterator<Item = (u32, &str)> {
        self.masked
            .iter()
            .enumerate()
            .map(|(i, l)| (i as u32 + 1, l.as_str()))
    }

    /// A fresh lazy token stream
    pub fn tokens(&self) -> Tokens<'_> {
        self.lexer.tokens(&self.text)
    }

    pub fn stats(&self) -> &StructuralStats {
        &self.stats
    }

    pub fn has_comment(&self, n: u32) -> bool {
        self.info(n).is_some_and(|i| i.has_comment)
    }

    /// A line holding only a comment (no code tokens)
    pub fn is_comment_only(&self, n: u32) -> bool {
        self.info(n).is_some_and(|i| i.has_comment && !i.has_code)
    }

    /// The line begins inside a multi-line string literal
    pub fn starts_in_string(&self, n: u32) -> bool {
        self.info(n).is_some_and(|i| i.starts_in_string)
    }

    /// The line's terminator falls inside a multi-line string literal
    pub fn ends_in_string(&self, n: u32) -> bool {
        self.info(n).is_some_and(|i| i.ends_in_string)
    }

    /// A non-blank line carrying at least one code token
    pub fn is_code_line(&self, n: u32) -> bool {
        self.info(n).is_some_and(|i| i.has_code)
            && self.line(n).is_some_and(|l| !l.trim().is_empty())
    }

    /// The line continues an earlier one: it starts inside a string, inside
    /// open brackets, or after a trailing backslash
    pub fn is_continuation(&self, n: u32) -> bool {
        let Some(info) = self.info(n) else {
            return false;
        };
        info.starts_in_string
            || info.bracket_depth > 0
            || (n > 1
                && self
                    .code(n - 1)
                    .is_some_and(|prev| prev.trim_end().ends_with('\\')))
    }

    /// Indentation width in columns
    pub fn indent(&self, n: u32) -> usize {
        self.line(n)
            .map(|l| indent_width(l, self.tab_width))
            .unwrap_or(0)
    }

    /// Columns per tab stop for this language
    pub fn tab_width(&self) -> usize {
        self.tab_width
    }

    pub fn nesting(&self, n: u32) -> u32 {
        self.index(n)
            .and_then(|i| self.stats.nesting_profile.get(i).copied())
            .unwrap_or(0)
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Clamp a line number into `[1, line_count]`
    pub fn clamp_line(&self, line: u32) -> u32 {
        line.clamp(1, self.lines.len().max(1) as u32)
    }

    /// Terminator of each line as submitted, parallel to [`Self::lines`]
    pub fn line_endings(&self) -> &[LineEnding] {
        &self.endings
    }

    /// Rejoin lines, each with its paired terminator. Lines past the end of
    /// `endings` use the submission's first-seen style.
    pub fn join_lines(&self, lines: &[String], endings: &[LineEnding]) -> String {
        let mut out = String::new();
        for (i, line) in lines.iter().enumerate() {
            out.push_str(line);
            if i + 1 < lines.len() || self.trailing_newline {
                let ending = endings.get(i).copied().unwrap_or(self.line_ending);
                out.push_str(ending.as_str());
            }
        }
        out
    }

    fn index(&self, n: u32) -> Option<usize> {
        let i = (n as usize).checked_sub(1)?;
        (i < self.lines.len()).then_some(i)
    }

    fn info(&self, n: u32) -> Option<&LineInfo> {
        self.index(n).map(|i| &self.infos[i])
    }
}

/// Python's tokenizer uses 8-column tab stops
pub fn tab_width(language: &Language) -> usize {
    if *language == Language::Python {
        8
    } else {
        4
    }
}

/// One pass over the token stream collecting per-line facts and the masked
/// code view.
fn scan_lines(text: &str, lines: &[String], lexer: &Lexer) -> (Vec<LineInfo>, Vec<String>) {
    let n = lines.len();
    let mut infos = vec![LineInfo::default(); n];
    let mut masked: Vec<Vec<char>> = lines.iter().map(|l| l.chars().collect()).collect();
    let mut seen = vec![false; n];
    let (mut braces, mut brackets) = (0u32, 0u32);

    for tok in lexer.tokens(text) {
        let first = tok.line as usize - 1;
        if first >= n {
            break;
        }
        let last = (tok.end_line() as usize - 1).min(n - 1);

        if !seen[first] {
            seen[first] = true;
            infos[first].brace_depth = braces;
            infos[first].bracket_depth = brackets;
            infos[first].opens_with_close_brace = tok.is_punct("}");
        }

        match tok.kind {
            TokenKind::Comment => {
                for info in &mut infos[first..=last] {
                    info.has_comment = true;
                }
                blank(&mut masked, &tok, false);
            }
            TokenKind::Str => {
                for info in &mut infos[first..=last] {
                    info.has_code = true;
                }
                for info in &mut infos[first + 1..=last] {
                    info.starts_in_string = true;
                }
                for info in &mut infos[first..last] {
                    info.ends_in_string = true;
                }
                blank(&mut masked, &tok, true);
            }
            TokenKind::Punct if !lexer.is_generic() => {
                infos[first].has_code = true;
                match tok.text.as_str() {
                    "{" => braces += 1,
                    "}" => braces = braces.saturating_sub(1),
                    "(" | "[" => brackets += 1,
                    ")" | "]" => brackets = brackets.saturating_sub(1),
                    _ => {}
                }
            }
            _ => infos[first].has_code = true,
        }
    }

    let masked = masked.into_iter().map(|l| l.into_iter().collect()).collect();
    (infos, masked)
}

/// Replace a token's characters with spaces, optionally keeping its first
/// and last character (string delimiters).
fn blank(masked: &mut [Vec<char>], tok: &Token, keep_ends: bool) {
    let total = tok.text.chars().count();
    let (mut line, mut col) = (tok.line as usize - 1, tok.col);
    for (i, c) in tok.text.chars().enumerate() {
        if c == '\n' {
            line += 1;
            col = 0;
            continue;
        }
        let keep = keep_ends && (i == 0 || i + 1 == total);
        if !keep {
            if let Some(slot) = masked.get_mut(line).and_then(|l| l.get_mut(col)) {
                *slot = ' ';
            }
        }
        col += 1;
    }
}
