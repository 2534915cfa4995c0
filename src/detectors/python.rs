//! Python structure helpers
//!
//! Line-level structure recovered from the normalized source: logical
//! statements, function signatures, possibly-unbound reads and
//! append-loops. Detectors use these to report findings; the patches in
//! `crate::fixes` call the same analyses again on the pre-fix snapshot so a
//! finding and its fix always agree.

use crate::normalizer::{SourceFile, Token, TokenKind};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

static DEF_RE: OnceLock<Regex> = OnceLock::new();
static FOR_RE: OnceLock<Regex> = OnceLock::new();
static IF_RE: OnceLock<Regex> = OnceLock::new();
static EMPTY_LIST_RE: OnceLock<Regex> = OnceLock::new();
static TARGET_RE: OnceLock<Regex> = OnceLock::new();
static FSTRING_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn def_re() -> &'static Regex {
    DEF_RE.get_or_init(|| Regex::new(r"^(\s*)(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\(").unwrap())
}

fn for_re() -> &'static Regex {
    FOR_RE.get_or_init(|| Regex::new(r"^for\s+(.+?)\s+in\s+(.+):$").unwrap())
}

fn if_re() -> &'static Regex {
    IF_RE.get_or_init(|| Regex::new(r"^if\s+(.+):$").unwrap())
}

fn empty_list_re() -> &'static Regex {
    EMPTY_LIST_RE.get_or_init(|| Regex::new(r"^([A-Za-z_]\w*)\s*=\s*\[\s*\]$").unwrap())
}

fn target_re() -> &'static Regex {
    TARGET_RE.get_or_init(|| Regex::new(r"^[A-Za-z_][\w\s,()]*$").unwrap())
}

fn fstring_name_re() -> &'static Regex {
    FSTRING_NAME_RE.get_or_init(|| Regex::new(r"\{([A-Za-z_]\w*)").unwrap())
}

/// Builtin names that are never reported as unbound
const BUILTINS: &[&str] = &["self", "cls", "print", "len", "range", "super"];

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// A logical statement: its first line plus any continuation lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stmt {
    pub start: u32,
    pub end: u32,
    pub indent: usize,
}

/// Every logical statement in the file, in order
pub fn statements(source: &SourceFile) -> Vec<Stmt> {
    let mut out: Vec<Stmt> = Vec::new();
    for n in 1..=source.line_count() as u32 {
        if source.is_continuation(n) {
            if let Some(last) = out.last_mut() {
                last.end = n;
            }
            continue;
        }
        if source.is_code_line(n) {
            out.push(Stmt {
                start: n,
                end: n,
                indent: source.indent(n),
            });
        }
    }
    out
}

/// Masked text of a statement's first line, trimmed
fn head(source: &SourceFile, stmt: &Stmt) -> String {
    source.code(stmt.start).unwrap_or("").trim().to_string()
}

fn first_word(text: &str) -> &str {
    let end = text
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    &text[..end]
}

/// Tokens grouped by the line they start on
pub fn tokens_by_line(source: &SourceFile) -> HashMap<u32, Vec<Token>> {
    let mut map: HashMap<u32, Vec<Token>> = HashMap::new();
    for tok in source.tokens() {
        map.entry(tok.line).or_default().push(tok);
    }
    map
}

fn stmt_tokens<'a>(toks: &'a HashMap<u32, Vec<Token>>, stmt: &Stmt) -> Vec<&'a Token> {
    (stmt.start..=stmt.end)
        .filter_map(|l| toks.get(&l))
        .flatten()
        .filter(|t| t.kind != TokenKind::Comment)
        .collect()
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Plain,
    VarArgs,
    KwArgs,
    /// A bare `*` or `/`
    Separator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyParam {
    pub name: String,
    pub kind: ParamKind,
    pub annotated: bool,
    pub default: Option<String>,
    /// Char offset just past the name, counted from the start of the `def`
    /// line (meaningful for single-line headers)
    pub name_end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyFunction {
    pub name: String,
    pub def_line: u32,
    /// Line holding the `:` that ends the signature
    pub header_end: u32,
    pub indent: usize,
    pub params: Vec<PyParam>,
    pub has_return_annotation: bool,
    /// Char offset of the `)` closing the parameter list (single-line headers)
    pub close_paren: usize,
    pub body_start: u32,
    pub body_end: u32,
}

impl PyFunction {
    /// Number of lines the body spans
    pub fn body_lines(&self) -> usize {
        (self.body_end - self.body_start + 1) as usize
    }

    pub fn single_line_header(&self) -> bool {
        self.def_line == self.header_end
    }

    /// Parameters that should carry an annotation but do not
    pub fn unannotated_params(&self) -> impl Iterator<Item = &PyParam> {
        self.params.iter().enumerate().filter_map(|(i, p)| {
            let receiver = i == 0 && (p.name == "self" || p.name == "cls");
            (p.kind != ParamKind::Separator && !p.annotated && !receiver).then_some(p)
        })
    }
}

/// All `def` statements in the file
pub fn functions(source: &SourceFile) -> Vec<PyFunction> {
    source
        .code_lines()
        .filter_map(|(n, code)| {
            let caps = def_re().captures(code)?;
            let name = caps.get(2)?.as_str().to_string();
            let open = code[..caps.get(0)?.end()].chars().count() - 1;
            parse_function(source, n, name, open)
        })
        .collect()
}

fn parse_function(source: &SourceFile, def_line: u32, name: String, open: usize) -> Option<PyFunction> {
    // Concatenate masked header lines until the signature's closing `:`
    let mut chars: Vec<char> = Vec::new();
    let mut depth = 0i32;
    let mut close_paren = None;
    let mut header_colon = None;
    let mut idx = 0usize;
    let mut ln = def_line;

    while header_colon.is_none() && ln as usize <= source.line_count() && ln < def_line + 50 {
        chars.extend(source.code(ln)?.chars());
        chars.push('\n');
        while idx < chars.len() {
            let c = chars[idx];
            if idx >= open {
                match c {
                    '(' | '[' | '{' => depth += 1,
                    ')' | ']' | '}' => {
                        depth -= 1;
                        if depth == 0 && close_paren.is_none() {
                            close_paren = Some(idx);
                        }
                    }
                    ':' if depth == 0 && close_paren.is_some() => {
                        header_colon = Some((idx, ln));
                        break;
                    }
                    _ => {}
                }
            }
            idx += 1;
        }
        if header_colon.is_none() {
            ln += 1;
        }
    }

    let close_paren = close_paren?;
    let (colon, header_end) = header_colon?;
    let params = parse_params(&chars[open + 1..close_paren], open + 1);
    let has_return_annotation = chars[close_paren..colon].iter().collect::<String>().contains("->");

    let indent = source.indent(def_line);
    let inline_body = chars[colon + 1..]
        .iter()
        .take_while(|c| **c != '\n')
        .any(|c| !c.is_whitespace());

    let (body_start, body_end) = if inline_body {
        (header_end, header_end)
    } else {
        let mut end = None;
        for n in header_end + 1..=source.line_count() as u32 {
            if !source.is_code_line(n) || source.is_continuation(n) {
                continue;
            }
            if source.indent(n) <= indent {
                break;
            }
            end = Some(n);
        }
        let end = end?;
        // Extend through continuation lines of the last statement
        let mut last = end;
        while last < source.line_count() as u32 && source.is_continuation(last + 1) {
            last += 1;
        }
        (header_end + 1, last)
    };

    Some(PyFunction {
        name,
        def_line,
        header_end,
        indent,
        params,
        has_return_annotation,
        close_paren,
        body_start,
        body_end,
    })
}

fn parse_params(segment: &[char], offset: usize) -> Vec<PyParam> {
    let mut pieces: Vec<(usize, usize)> = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in segment.iter().enumerate() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                pieces.push((start, i));
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push((start, segment.len()));

    pieces
        .into_iter()
        .filter_map(|(s, e)| {
            let piece = &segment[s..e];
            let lead = piece.iter().take_while(|c| c.is_whitespace()).count();
            let body: String = piece[lead..].iter().collect();
            let trimmed = body.trim();
            if trimmed.is_empty() {
                return None;
            }
            if trimmed == "*" || trimmed == "/" {
                return Some(PyParam {
                    name: trimmed.to_string(),
                    kind: ParamKind::Separator,
                    annotated: false,
                    default: None,
                    name_end: offset + s + lead + 1,
                });
            }
            let stars = body.chars().take_while(|c| *c == '*').count();
            let kind = match stars {
                0 => ParamKind::Plain,
                1 => ParamKind::VarArgs,
                _ => ParamKind::KwArgs,
            };
            let name: String = body
                .chars()
                .skip(stars)
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            let name_len = name.chars().count();
            let rest: String = body.chars().skip(stars + name_len).collect();
            let rest = rest.trim_start();
            let annotated = rest.starts_with(':');
            let default = top_level_find(rest, '=').map(|i| rest[i + 1..].trim().to_string());
            Some(PyParam {
                name,
                kind,
                annotated,
                default,
                name_end: offset + s + lead + stars + name_len,
            })
        })
        .collect()
}

/// Byte index of `needle` outside any brackets
fn top_level_find(text: &str, needle: char) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            c if c == needle && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Possibly-unbound reads
// ---------------------------------------------------------------------------

/// A read of a name that only some paths assign
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnboundRead {
    pub name: String,
    /// Line of the read
    pub line: u32,
    /// First line of the compound statement that conditionally assigns it
    pub anchor: u32,
    /// Leading whitespace of the anchor line, verbatim
    pub indent: String,
}

/// Reads of names that are assigned only on some paths, per scope
/// (module level and each function body).
///
/// Control flow is tracked only between the direct children of a scope.
/// A compound statement counts as one step: reads anywhere inside it,
/// nested blocks included, are checked against what earlier siblings
/// left possibly unbound. Flow inside a compound statement is not
/// modelled, so a read inside a compound statement that itself assigns
/// the name is never reported, even when it can run first (a loop body
/// reading what a nested `if` assigns on an earlier iteration).
pub fn unbound_reads(source: &SourceFile) -> Vec<UnboundRead> {
    let stmts = statements(source);
    let toks = tokens_by_line(source);
    let mut out = Vec::new();

    let module = ScopeWalk {
        source,
        stmts: &stmts,
        toks: &toks,
    };
    module.run(0, stmts.len(), 0, HashSet::new(), &mut out);

    for func in functions(source) {
        if func.body_start == func.header_end {
            continue;
        }
        let lo = stmts.partition_point(|s| s.start < func.body_start);
        let hi = stmts.partition_point(|s| s.start <= func.body_end);
        let Some(first) = stmts.get(lo).filter(|_| lo < hi) else {
            continue;
        };
        let params: HashSet<String> = func
            .params
            .iter()
            .filter(|p| p.kind != ParamKind::Separator)
            .map(|p| p.name.clone())
            .collect();
        module.run(lo, hi, first.indent, params, &mut out);
    }

    out.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.name.cmp(&b.name)));
    out.dedup_by(|a, b| a.line == b.line && a.name == b.name);
    out
}

struct ScopeWalk<'a> {
    source: &'a SourceFile,
    stmts: &'a [Stmt],
    toks: &'a HashMap<u32, Vec<Token>>,
}

/// One clause of a compound statement (`if`, `elif`, `except`, ...)
struct Clause {
    keyword: String,
    header: usize,
    /// Statement index range of the clause body
    body: (usize, usize),
}

impl ScopeWalk<'_> {
    fn run(
        &self,
        lo: usize,
        hi: usize,
        indent: usize,
        mut bound: HashSet<String>,
        out: &mut Vec<UnboundRead>,
    ) {
        let mut maybe: HashMap<String, u32> = HashMap::new();
        let mut exempt: HashSet<String> = HashSet::new();

        // Direct children of the scope
        let children: Vec<usize> = (lo..hi).filter(|&i| self.stmts[i].indent == indent).collect();
        let block_end = |pos: usize| children.get(pos + 1).copied().unwrap_or(hi);

        let mut pos = 0;
        while pos < children.len() {
            let i = children[pos];
            let stmt = self.stmts[i];
            let text = head(self.source, &stmt);
            let keyword = keyword_of(&text);

            match keyword.as_str() {
                "def" | "class" => {
                    if let Some(name) = defined_name(&text) {
                        bound.insert(name);
                    }
                    pos += 1;
                }
                "@" => pos += 1,
                "global" | "nonlocal" => {
                    for name in text[keyword.len()..].split(',') {
                        exempt.insert(name.trim().to_string());
                    }
                    pos += 1;
                }
                kw if starts_chain(kw, &text) => {
                    let mut clauses = vec![Clause {
                        keyword: keyword.clone(),
                        header: i,
                        body: (i + 1, block_end(pos)),
                    }];
                    let mut next = pos + 1;
                    while let Some(&j) = children.get(next) {
                        let kw = keyword_of(&head(self.source, &self.stmts[j]));
                        if !continues_chain(&keyword, &kw) {
                            break;
                        }
                        clauses.push(Clause {
                            keyword: kw,
                            header: j,
                            body: (j + 1, block_end(next)),
                        });
                        next += 1;
                    }
                    let chain_end = clauses.last().map(|c| c.body.1).unwrap_or(i + 1);
                    self.visit_chain(&clauses, (i, chain_end), &mut bound, &mut maybe, &exempt, out);
                    pos = next;
                }
                _ => {
                    let tokens = stmt_tokens(self.toks, &stmt);
                    let (targets, reads) = simple_targets_and_reads(&tokens);
                    self.report(&reads, &mut bound, &maybe, &exempt, out);
                    for t in targets {
                        maybe.remove(&t);
                        bound.insert(t);
                    }
                    pos += 1;
                }
            }
        }
    }

    fn report(
        &self,
        reads: &[(String, u32)],
        bound: &mut HashSet<String>,
        maybe: &HashMap<String, u32>,
        exempt: &HashSet<String>,
        out: &mut Vec<UnboundRead>,
    ) {
        for (name, line) in reads {
            if bound.contains(name) || exempt.contains(name) {
                continue;
            }
            if let Some(&anchor) = maybe.get(name) {
                let raw = self.source.line(anchor).unwrap_or("");
                let indent: String = raw.chars().take_while(|c| c.is_whitespace()).collect();
                out.push(UnboundRead {
                    name: name.clone(),
                    line: *line,
                    anchor,
                    indent,
                });
                // One report per name
                bound.insert(name.clone());
            }
        }
    }

    fn visit_chain(
        &self,
        clauses: &[Clause],
        range: (usize, usize),
        bound: &mut HashSet<String>,
        maybe: &mut HashMap<String, u32>,
        exempt: &HashSet<String>,
        out: &mut Vec<UnboundRead>,
    ) {
        let mut per_clause: Vec<(HashSet<String>, bool)> = Vec::new();
        let mut all_assigned: HashSet<String> = HashSet::new();
        let mut reads: Vec<(String, u32)> = Vec::new();

        for clause in clauses {
            let header = self.stmts[clause.header];
            let tokens = stmt_tokens(self.toks, &header);
            let (mut assigned, header_reads) = header_targets_and_reads(&tokens);
            reads.extend(header_reads);
            let mut terminates = false;
            let body_indent = self.stmts.get(clause.body.0).map(|s| s.indent);
            for k in clause.body.0..clause.body.1 {
                let stmt = self.stmts[k];
                let tokens = stmt_tokens(self.toks, &stmt);
                let text = head(self.source, &stmt);
                let kw = keyword_of(&text);
                if Some(stmt.indent) == body_indent
                    && matches!(kw.as_str(), "return" | "raise" | "continue" | "break")
                {
                    terminates = true;
                }
                let (targets, body_reads): (Vec<String>, Vec<(String, u32)>) = if matches!(
                    kw.as_str(),
                    "def" | "class"
                ) {
                    (defined_name(&text).into_iter().collect(), Vec::new())
                } else if is_compound(&kw) {
                    let (names, reads) = header_targets_and_reads(&tokens);
                    (names.into_iter().collect(), reads)
                } else {
                    simple_targets_and_reads(&tokens)
                };
                assigned.extend(targets);
                reads.extend(body_reads);
            }
            all_assigned.extend(assigned.iter().cloned());
            per_clause.push((assigned, terminates));
        }

        let reads: Vec<(String, u32)> = reads
            .into_iter()
            .filter(|(name, _)| !all_assigned.contains(name))
            .collect();
        self.report(&reads, bound, maybe, exempt, out);

        let definite = definitely_assigned(clauses, &per_clause, self.source, &self.stmts[range.0]);
        let anchor = self.stmts[range.0].start;
        for name in all_assigned {
            if definite.contains(&name) {
                maybe.remove(&name);
                bound.insert(name);
            } else if !bound.contains(&name) {
                maybe.entry(name).or_insert(anchor);
            }
        }
    }
}

fn keyword_of(text: &str) -> String {
    if text.starts_with('@') {
        return "@".to_string();
    }
    let word = first_word(text);
    if word == "async" {
        let rest = text[word.len()..].trim_start();
        return first_word(rest).to_string();
    }
    word.to_string()
}

/// Name bound by a `def` or `class` statement
fn defined_name(text: &str) -> Option<String> {
    let text = text.strip_prefix("async").unwrap_or(text).trim_start();
    text.split_whitespace().nth(1).map(|n| first_word(n).to_string())
}

/// `match` is a soft keyword; only a header ending in `:` opens a block
fn starts_chain(keyword: &str, text: &str) -> bool {
    match keyword {
        "if" | "for" | "while" | "try" | "with" => true,
        "match" => text.ends_with(':'),
        _ => false,
    }
}

fn is_compound(keyword: &str) -> bool {
    matches!(
        keyword,
        "if" | "elif" | "else" | "for" | "while" | "try" | "except" | "finally" | "with" | "match" | "case"
    )
}

fn continues_chain(first: &str, next: &str) -> bool {
    match first {
        "if" => matches!(next, "elif" | "else"),
        "for" | "while" => next == "else",
        "try" => matches!(next, "except" | "else" | "finally"),
        _ => false,
    }
}

/// Clause sets for clauses matching `pred` that do not end in
/// `return`/`raise`/`continue`/`break`
fn live_sets<'a>(
    clauses: &[Clause],
    per_clause: &'a [(HashSet<String>, bool)],
    pred: impl Fn(&Clause) -> bool,
) -> Vec<&'a HashSet<String>> {
    clauses
        .iter()
        .zip(per_clause)
        .filter(|(c, (_, terminates))| pred(c) && !terminates)
        .map(|(_, (set, _))| set)
        .collect()
}

fn intersect(sets: Vec<&HashSet<String>>) -> HashSet<String> {
    let mut iter = sets.into_iter();
    match iter.next() {
        Some(first) => iter.fold(first.clone(), |acc, s| acc.intersection(s).cloned().collect()),
        None => HashSet::new(),
    }
}

/// Names every non-terminating path through the chain assigns
fn definitely_assigned(
    clauses: &[Clause],
    per_clause: &[(HashSet<String>, bool)],
    source: &SourceFile,
    first: &Stmt,
) -> HashSet<String> {
    match clauses[0].keyword.as_str() {
        "with" => per_clause[0].0.clone(),
        "if" => {
            if clauses.iter().any(|c| c.keyword == "else") {
                intersect(live_sets(clauses, per_clause, |_| true))
            } else {
                HashSet::new()
            }
        }
        "while" => {
            let text = head(source, first);
            if text.starts_with("while True") || text.starts_with("while 1") {
                per_clause[0].0.clone()
            } else {
                HashSet::new()
            }
        }
        "try" => {
            let mut success: HashSet<String> = HashSet::new();
            let mut finally: HashSet<String> = HashSet::new();
            for (c, (set, _)) in clauses.iter().zip(per_clause) {
                match c.keyword.as_str() {
                    "try" | "else" => success.extend(set.iter().cloned()),
                    "finally" => finally.extend(set.iter().cloned()),
                    _ => {}
                }
            }
            let handlers = live_sets(clauses, per_clause, |c| c.keyword == "except");
            let mut definite: HashSet<String> = success
                .into_iter()
                .filter(|name| handlers.iter().all(|h| h.contains(name)))
                .collect();
            definite.extend(finally);
            definite
        }
        _ => HashSet::new(),
    }
}

/// Identifier reads, excluding attributes, keyword-argument names and
/// names bound by comprehensions or lambdas within the same tokens.
fn reads_of(tokens: &[&Token]) -> Vec<(String, u32)> {
    let mut local: HashSet<&str> = HashSet::new();
    for (i, tok) in tokens.iter().enumerate() {
        if tok.is_keyword("for") {
            for t in tokens[i + 1..].iter().take_while(|t| !t.is_keyword("in")) {
                if t.kind == TokenKind::Ident {
                    local.insert(&t.text);
                }
            }
        }
        if tok.is_keyword("lambda") {
            for t in tokens[i + 1..].iter().take_while(|t| !t.is_punct(":")) {
                if t.kind == TokenKind::Ident {
                    local.insert(&t.text);
                }
            }
        }
    }

    let mut reads = Vec::new();
    let mut depth = 0i32;
    for (i, tok) in tokens.iter().enumerate() {
        match tok.kind {
            TokenKind::Punct => match tok.text.as_str() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => depth -= 1,
                _ => {}
            },
            TokenKind::Str => {
                let prefix: String = tok.text.chars().take_while(|c| c.is_alphabetic()).collect();
                if prefix.contains(['f', 'F']) {
                    for caps in fstring_name_re().captures_iter(&tok.text) {
                        reads.push((caps[1].to_string(), tok.line));
                    }
                }
            }
            TokenKind::Ident => {
                let after_dot = i > 0 && tokens[i - 1].is_punct(".");
                let kwarg = depth > 0 && tokens.get(i + 1).is_some_and(|t| t.is_punct("="));
                if !after_dot && !kwarg && !local.contains(tok.text.as_str()) {
                    reads.push((tok.text.clone(), tok.line));
                }
            }
            _ => {}
        }
    }
    reads.retain(|(name, _)| !BUILTINS.contains(&name.as_str()));
    reads
}

/// Split a token run at depth-0 tokens matching `pred`
fn split_top_level<'a>(tokens: &[&'a Token], pred: impl Fn(&Token) -> bool) -> Vec<Vec<&'a Token>> {
    let mut parts = vec![Vec::new()];
    let mut depth = 0i32;
    for tok in tokens {
        if tok.kind == TokenKind::Punct {
            match tok.text.as_str() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => depth -= 1,
                _ => {}
            }
        }
        if depth == 0 && pred(tok) {
            parts.push(Vec::new());
        } else if let Some(last) = parts.last_mut() {
            last.push(*tok);
        }
    }
    parts
}

/// Plain names bound by an assignment target (`a`, `a, b`, `(a, b)`);
/// subscripts and attributes bind nothing and are reads instead.
fn binding_names(target: &[&Token]) -> (Vec<String>, Vec<(String, u32)>) {
    let mut names = Vec::new();
    let mut reads = Vec::new();
    for (i, tok) in target.iter().enumerate() {
        if tok.kind != TokenKind::Ident {
            continue;
        }
        let after_dot = i > 0 && target[i - 1].is_punct(".");
        let before_access = target
            .get(i + 1)
            .is_some_and(|t| t.is_punct(".") || t.is_punct("["));
        let in_subscript = target[..i].iter().filter(|t| t.is_punct("[")).count()
            > target[..i].iter().filter(|t| t.is_punct("]")).count();
        if after_dot {
            continue;
        }
        if before_access || in_subscript {
            reads.push((tok.text.clone(), tok.line));
        } else {
            names.push(tok.text.clone());
        }
    }
    (names, reads)
}

const AUGMENTED: &[&str] = &["+=", "-=", "*=", "/=", "//=", "%=", "**=", "&=", "|=", "^=", ">>=", "<<="];

fn simple_targets_and_reads(tokens: &[&Token]) -> (Vec<String>, Vec<(String, u32)>) {
    let Some(first) = tokens.first() else {
        return (Vec::new(), Vec::new());
    };

    if first.is_keyword("import") || first.is_keyword("from") {
        return (import_bindings(tokens), Vec::new());
    }
    if first.is_keyword("del") || first.is_keyword("global") || first.is_keyword("nonlocal") {
        return (Vec::new(), Vec::new());
    }

    // Augmented assignment reads and rebinds its target
    let aug = split_top_level(tokens, |t| {
        t.kind == TokenKind::Punct && AUGMENTED.contains(&t.text.as_str())
    });
    if aug.len() == 2 {
        let (names, mut reads) = binding_names(&aug[0]);
        reads.extend(names.iter().map(|n| (n.clone(), first.line)));
        reads.extend(reads_of(&aug[1]));
        return (names, reads);
    }

    let parts = split_top_level(tokens, |t| t.is_punct("="));
    if parts.len() == 1 {
        // Annotated declaration without a value binds nothing
        return (Vec::new(), reads_of(tokens));
    }

    let Some((value, target_parts)) = parts.split_last() else {
        return (Vec::new(), Vec::new());
    };
    let mut targets = Vec::new();
    let mut reads = Vec::new();
    for part in target_parts {
        // `x: int = ...`
        let target: Vec<&Token> = split_top_level(part, |t| t.is_punct(":"))
            .into_iter()
            .next()
            .unwrap_or_default();
        let (names, target_reads) = binding_names(&target);
        targets.extend(names);
        reads.extend(target_reads);
    }
    reads.extend(reads_of(value));
    (targets, reads)
}

fn import_bindings(tokens: &[&Token]) -> Vec<String> {
    let start = if tokens[0].is_keyword("from") {
        match tokens.iter().position(|t| t.is_keyword("import")) {
            Some(i) => i + 1,
            None => return Vec::new(),
        }
    } else {
        1
    };
    let names: Vec<&Token> = tokens[start..]
        .iter()
        .filter(|t| !t.is_punct("(") && !t.is_punct(")"))
        .copied()
        .collect();
    split_top_level(&names, |t| t.is_punct(","))
        .into_iter()
        .filter_map(|part| {
            let idents: Vec<&&Token> = part.iter().filter(|t| t.kind == TokenKind::Ident).collect();
            if part.iter().any(|t| t.is_keyword("as")) {
                idents.last().map(|t| t.text.clone())
            } else if tokens[0].is_keyword("import") {
                idents.first().map(|t| t.text.clone())
            } else {
                idents.last().map(|t| t.text.clone())
            }
        })
        .collect()
}

/// Targets and reads of a compound-statement header, including an inline
/// body after the colon (`if x: y = 1`)
fn header_targets_and_reads(tokens: &[&Token]) -> (HashSet<String>, Vec<(String, u32)>) {
    let mut parts = split_top_level(tokens, |t| t.is_punct(":")).into_iter();
    let header = parts.next().unwrap_or_default();
    let inline: Vec<&Token> = parts.flatten().collect();

    let mut targets: HashSet<String> = HashSet::new();
    let mut reads = Vec::new();
    let keyword = header
        .iter()
        .find(|t| t.kind == TokenKind::Keyword && t.text != "async")
        .map(|t| t.text.as_str());

    match keyword {
        Some("for") => {
            let in_pos = header.iter().position(|t| t.is_keyword("in")).unwrap_or(header.len());
            let for_pos = header.iter().position(|t| t.is_keyword("for")).unwrap_or(0);
            let (names, target_reads) = binding_names(&header[for_pos + 1..in_pos]);
            targets.extend(names);
            reads.extend(target_reads);
            reads.extend(reads_of(&header[in_pos.min(header.len())..]));
        }
        _ => {
            let mut skip: HashSet<usize> = HashSet::new();
            for (i, tok) in header.iter().enumerate() {
                if tok.is_keyword("as") {
                    if let Some(t) = header.get(i + 1).filter(|t| t.kind == TokenKind::Ident) {
                        targets.insert(t.text.clone());
                        skip.insert(i + 1);
                    }
                }
            }
            let rest: Vec<&Token> = header
                .iter()
                .enumerate()
                .filter(|(i, _)| !skip.contains(i))
                .map(|(_, t)| *t)
                .collect();
            reads.extend(reads_of(&rest));
        }
    }

    if !inline.is_empty() {
        let (names, inline_reads) = simple_targets_and_reads(&inline);
        targets.extend(names);
        reads.extend(inline_reads);
    }
    (targets, reads)
}

// ---------------------------------------------------------------------------
// Append loops
// ---------------------------------------------------------------------------

/// `x = []` followed by a `for` loop whose body only appends to `x`
/// (optionally behind a single `if`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendLoop {
    pub list: String,
    /// Line of `x = []`
    pub init_line: u32,
    pub for_line: u32,
    /// Last line of the loop body
    pub end_line: u32,
    /// The single line that replaces `init_line..=end_line`
    pub rewrite: String,
}

/// Every append loop that can be rewritten as a list comprehension without
/// changing behavior.
pub fn append_loops(source: &SourceFile) -> Vec<AppendLoop> {
    let stmts = statements(source);
    let toks = tokens_by_line(source);
    let mut out = Vec::new();

    for (i, init) in stmts.iter().enumerate() {
        if let Some(found) = match_append_loop(source, &stmts, &toks, i, init) {
            out.push(found);
        }
    }
    out
}

fn match_append_loop(
    source: &SourceFile,
    stmts: &[Stmt],
    toks: &HashMap<u32, Vec<Token>>,
    i: usize,
    init: &Stmt,
) -> Option<AppendLoop> {
    let raw_trimmed = |s: &Stmt| source.line(s.start).map(str::trim);
    let single_line = |s: &Stmt| s.start == s.end && !source.has_comment(s.start);

    let list = empty_list_re()
        .captures(raw_trimmed(init)?)?
        .get(1)?
        .as_str()
        .to_string();
    if !single_line(init) {
        return None;
    }

    let header = stmts.get(i + 1)?;
    if header.indent != init.indent || header.start != init.end + 1 || !single_line(header) {
        return None;
    }
    let for_caps = for_re().captures(raw_trimmed(header)?)?;
    let target = for_caps.get(1)?.as_str().trim();
    let iterable = for_caps.get(2)?.as_str().trim();
    if !target_re().is_match(target) {
        return None;
    }

    // Body: one append, or one `if` guarding one append
    let body: Vec<&Stmt> = stmts[i + 2..]
        .iter()
        .take_while(|s| s.indent > header.indent)
        .collect();
    let (condition, append) = match body.as_slice() {
        [append] => (None, *append),
        [guard, append] if append.indent > guard.indent => {
            if !single_line(guard) {
                return None;
            }
            let caps = if_re().captures(raw_trimmed(guard)?)?;
            (Some(caps.get(1)?.as_str().trim().to_string()), *append)
        }
        _ => return None,
    };
    if !single_line(append) {
        return None;
    }
    let prefix = format!("{}.append(", list);
    let element = raw_trimmed(append)?
        .strip_prefix(prefix.as_str())?
        .strip_suffix(')')?
        .trim()
        .to_string();
    if element.is_empty() || !balanced(&element) || top_level_find(&element, ',').is_some() {
        return None;
    }

    let last_body = body.last()?;
    let after = stmts.get(i + 2 + body.len());
    // `for ... else` changes control flow
    if after.is_some_and(|s| s.indent == header.indent && head(source, s).starts_with("else")) {
        return None;
    }

    // The list must not be referenced while it is built (the append
    // receiver aside), and the body must be valid inside a comprehension
    let list_refs: usize = std::iter::once(header)
        .chain(body.iter().copied())
        .map(|s| {
            stmt_tokens(toks, s)
                .iter()
                .filter(|t| t.kind == TokenKind::Ident && t.text == list)
                .count()
        })
        .sum();
    if list_refs != 1 {
        return None;
    }
    if body.iter().any(|s| {
        stmt_tokens(toks, s)
            .iter()
            .any(|t| t.is_keyword("yield") || t.is_punct(":="))
    }) {
        return None;
    }

    // Comprehensions in a class body cannot see class-level names
    let (scope_lo, scope_hi) = match enclosing_scope(source, stmts, i) {
        Some(scope) if scope.is_class => return None,
        Some(scope) => (scope.header + 1, scope.end),
        None => (0, stmts.len()),
    };

    // Loop variables keep their last value after a loop but not after a
    // comprehension, so no other statement of the scope may mention them
    let loop_names: HashSet<&str> = target
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|s| !s.is_empty())
        .collect();
    let loop_stmts = i..i + 2 + body.len();
    if (scope_lo..scope_hi)
        .filter(|k| !loop_stmts.contains(k))
        .any(|k| {
            stmt_tokens(toks, &stmts[k])
                .iter()
                .any(|t| t.kind == TokenKind::Ident && loop_names.contains(t.text.as_str()))
        })
    {
        return None;
    }

    let indent: String = source
        .line(init.start)?
        .chars()
        .take_while(|c| c.is_whitespace())
        .collect();
    let rewrite = match condition {
        Some(cond) => format!("{indent}{list} = [{element} for {target} in {iterable} if {cond}]"),
        None => format!("{indent}{list} = [{element} for {target} in {iterable}]"),
    };

    Some(AppendLoop {
        list,
        init_line: init.start,
        for_line: header.start,
        end_line: last_body.end,
        rewrite,
    })
}

/// Innermost `def` or `class` body holding a statement
struct Scope {
    /// Statement index of the `def`/`class` header
    header: usize,
    /// One past the last statement of the body
    end: usize,
    is_class: bool,
}

fn enclosing_scope(source: &SourceFile, stmts: &[Stmt], i: usize) -> Option<Scope> {
    let mut indent = stmts[i].indent;
    for j in (0..i).rev() {
        let stmt = &stmts[j];
        if stmt.indent >= indent {
            continue;
        }
        indent = stmt.indent;
        let kw = keyword_of(&head(source, stmt));
        if kw == "def" || kw == "class" {
            let end = stmts[j + 1..]
                .iter()
                .position(|s| s.indent <= stmt.indent)
                .map_or(stmts.len(), |p| j + 1 + p);
            return Some(Scope {
                header: j,
                end,
                is_class: kw == "class",
            });
        }
        if indent == 0 {
            break;
        }
    }
    None
}

fn balanced(text: &str) -> bool {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;

    fn py(src: &str) -> SourceFile {
        SourceFile::new(src, Language::Python)
    }

    #[test]
    fn test_statements_join_continuations() {
        let src = py("x = foo(\n    1,\n)\ny = 2\n");
        let stmts = statements(&src);
        assert_eq!(stmts.len(), 2);
        assert_eq!((stmts[0].start, stmts[0].end), (1, 3));
        assert_eq!(stmts[1].start, 4);
    }

    #[test]
    fn test_function_signature() {
        let src = py("def f(self, a, b: int = 3, *args, **kw) -> int:\n    return a\n");
        let funcs = functions(&src);
        assert_eq!(funcs.len(), 1);
        let f = &funcs[0];
        assert_eq!(f.name, "f");
        assert!(f.has_return_annotation);
        assert_eq!(f.params.len(), 5);
        assert!(f.params[2].annotated);
        assert_eq!(f.params[2].default.as_deref(), Some("3"));
        assert_eq!(f.params[3].kind, ParamKind::VarArgs);
        let missing: Vec<_> = f.unannotated_params().map(|p| p.name.as_str()).collect();
        assert_eq!(missing, vec!["a", "args", "kw"]);
        assert_eq!((f.body_start, f.body_end), (2, 2));
    }

    #[test]
    fn test_function_multiline_header_and_body() {
        let src = py("def g(\n    a,\n    b,\n):\n    x = a\n\n    return x\ny = 1\n");
        let f = &functions(&src)[0];
        assert_eq!(f.header_end, 4);
        assert!(!f.single_line_header());
        assert_eq!((f.body_start, f.body_end), (5, 7));
        assert_eq!(f.body_lines(), 3);
    }

    #[test]
    fn test_name_end_offsets() {
        let src = py("def f(a, b=2):\n    pass\n");
        let f = &functions(&src)[0];
        let line: Vec<char> = "def f(a, b=2):".chars().collect();
        assert_eq!(line[f.params[0].name_end - 1], 'a');
        assert_eq!(line[f.params[1].name_end - 1], 'b');
        assert_eq!(line[f.close_paren], ')');
    }

    #[test]
    fn test_unbound_after_if_without_else() {
        let src = py(
            "def process(items):\n    if items:\n        result = len(items)\n    return result\n",
        );
        let reads = unbound_reads(&src);
        assert_eq!(reads.len(), 1);
        assert_eq!(reads[0].name, "result");
        assert_eq!(reads[0].line, 4);
        assert_eq!(reads[0].anchor, 2);
        assert_eq!(reads[0].indent, "    ");
    }

    #[test]
    fn test_if_else_binds_name() {
        let src = py("def f(a):\n    if a:\n        r = 1\n    else:\n        r = 2\n    return r\n");
        assert!(unbound_reads(&src).is_empty());
    }

    #[test]
    fn test_terminating_branch_is_ignored() {
        let src = py("def f(a):\n    if a:\n        r = 1\n    else:\n        raise ValueError()\n    return r\n");
        assert!(unbound_reads(&src).is_empty());
    }

    #[test]
    fn test_try_without_assigning_handler() {
        let src = py("try:\n    value = int(s)\nexcept ValueError:\n    print('bad')\nprint(value)\n");
        let reads = unbound_reads(&src);
        assert_eq!(reads.len(), 1);
        assert_eq!((reads[0].line, reads[0].anchor), (5, 1));
    }

    #[test]
    fn test_loop_assignment_is_possibly_unbound() {
        let src = py("for x in xs:\n    last = x\nprint(last)\n");
        let reads = unbound_reads(&src);
        assert_eq!(reads.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), vec!["last"]);
    }

    #[test]
    fn test_prior_assignment_binds() {
        let src = py("result = None\nif a:\n    result = 1\nprint(result)\n");
        assert!(unbound_reads(&src).is_empty());
    }

    #[test]
    fn test_read_in_later_loop_body_is_reported() {
        let src = py("if a:\n    n = 1\nfor i in xs:\n    if i:\n        print(n)\n");
        let reads = unbound_reads(&src);
        assert_eq!(reads.len(), 1);
        assert_eq!((reads[0].name.as_str(), reads[0].line, reads[0].anchor), ("n", 5, 1));
    }

    #[test]
    fn test_read_inside_assigning_statement_is_not_reported() {
        let src = py("for i in xs:\n    if a:\n        n = 1\n    print(n)\n");
        assert!(unbound_reads(&src).is_empty());
    }

    #[test]
    fn test_fstring_read_is_detected() {
        let src = py("if a:\n    name = 'x'\nprint(f\"hi {name}\")\n");
        assert_eq!(unbound_reads(&src).len(), 1);
    }

    #[test]
    fn test_append_loop_with_condition() {
        let src = py(
            "def process_items(items):\n    results = []\n    for item in items:\n        if item % 2 == 0:\n            results.append(item * 2)\n    return results\n",
        );
        let loops = append_loops(&src);
        assert_eq!(loops.len(), 1);
        let l = &loops[0];
        assert_eq!((l.init_line, l.for_line, l.end_line), (2, 3, 5));
        assert_eq!(l.rewrite, "    results = [item * 2 for item in items if item % 2 == 0]");
    }

    #[test]
    fn test_append_loop_rejects_loop_var_used_later() {
        let src = py("out = []\nfor x in xs:\n    out.append(x)\nprint(x)\n");
        assert!(append_loops(&src).is_empty());
    }

    #[test]
    fn test_append_loop_rejects_loop_var_read_after_enclosing_block() {
        let src = py("if flag:\n    out = []\n    for x in xs:\n        out.append(x)\nprint(x)\n");
        assert!(append_loops(&src).is_empty());
    }

    #[test]
    fn test_append_loop_rejects_loop_var_read_earlier_in_function() {
        let src = py(
            "def f(xs):\n    while xs:\n        print(x)\n        out = []\n        for x in xs:\n            out.append(x)\n        xs = out[1:]\n",
        );
        assert!(append_loops(&src).is_empty());
    }

    #[test]
    fn test_append_loop_ignores_other_functions() {
        let src = py(
            "def f(xs):\n    out = []\n    for x in xs:\n        out.append(x)\n    return out\n\ndef g(x):\n    return x\n",
        );
        assert_eq!(append_loops(&src).len(), 1);
    }

    #[test]
    fn test_append_loop_in_class_body_is_kept() {
        let src = py("class A:\n    k = 2\n    out = []\n    for x in range(3):\n        out.append(x * k)\n");
        assert!(append_loops(&src).is_empty());
    }

    #[test]
    fn test_append_loop_in_method_is_rewritten() {
        let src = py(
            "class A:\n    def run(self, xs):\n        out = []\n        for x in xs:\n            out.append(x)\n        return out\n",
        );
        assert_eq!(append_loops(&src).len(), 1);
    }

    #[test]
    fn test_append_loop_rejects_for_else() {
        let src = py("out = []\nfor x in xs:\n    out.append(x)\nelse:\n    pass\n");
        assert!(append_loops(&src).is_empty());
    }

    #[test]
    fn test_append_loop_rejects_extra_statements() {
        let src = py("out = []\nfor x in xs:\n    print(x)\n    out.append(x)\n");
        assert!(append_loops(&src).is_empty());
    }
}
