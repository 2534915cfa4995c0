//! Core data models for critique
//!
//! These types form the contract between the engine and its consumers
//! (display layer, history store). Field names serialize in camelCase so the
//! JSON matches what the review UI reads (`ruleId`, `bestPractices`,
//! `improvedCode`, ...).

use crate::normalizer::StructuralStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Generate a deterministic finding ID based on content hash.
///
/// The ID is a 16-character hex string derived from the rule, the line and
/// the message, so the same issue keeps the same ID across runs.
pub fn deterministic_finding_id(rule_id: &str, line: u32, message: &str) -> String {
    let input = format!("{rule_id}\n{line}\n{message}");
    let digest = Sha256::digest(input.as_bytes());
    format!("{:x}", digest)[..16].to_string()
}

/// Source language declared by a submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Cpp,
    C,
    Rust,
    Go,
    CSharp,
    /// A language with no registered grammar or detector set (degraded mode)
    Unsupported(String),
}

impl Language {
    /// Every language with first-class support
    pub const SUPPORTED: [Language; 9] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Java,
        Language::Cpp,
        Language::C,
        Language::Rust,
        Language::Go,
        Language::CSharp,
    ];

    /// Parse a user-supplied language name. Never fails: unknown names
    /// become `Unsupported`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "python" | "py" | "python3" => Language::Python,
            "javascript" | "js" | "jsx" | "node" => Language::JavaScript,
            "typescript" | "ts" | "tsx" => Language::TypeScript,
            "java" => Language::Java,
            "c++" | "cpp" | "cxx" | "cc" => Language::Cpp,
            "c" => Language::C,
            "rust" | "rs" => Language::Rust,
            "go" | "golang" => Language::Go,
            "c#" | "csharp" | "cs" => Language::CSharp,
            _ => Language::Unsupported(name.trim().to_string()),
        }
    }

    /// Infer a language from a filename extension
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())?
            .to_lowercase();
        let lang = match ext.as_str() {
            "py" | "pyi" => Language::Python,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" | "mts" | "cts" => Language::TypeScript,
            "java" => Language::Java,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
            "c" | "h" => Language::C,
            "rs" => Language::Rust,
            "go" => Language::Go,
            "cs" => Language::CSharp,
            _ => return None,
        };
        Some(lang)
    }

    /// Display name
    pub fn name(&self) -> &str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Java => "Java",
            Language::Cpp => "C++",
            Language::C => "C",
            Language::Rust => "Rust",
            Language::Go => "Go",
            Language::CSharp => "C#",
            Language::Unsupported(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Language::Unsupported(_))
    }

    /// JavaScript or TypeScript
    pub fn is_js_like(&self) -> bool {
        matches!(self, Language::JavaScript | Language::TypeScript)
    }
}

impl FromStr for Language {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Language::parse(s))
    }
}

impl From<String> for Language {
    fn from(s: String) -> Self {
        Language::parse(&s)
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.name().to_string()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Review depth requested by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewType {
    #[default]
    Full,
    QuickSyntax,
    SecurityOnly,
}

impl FromStr for ReviewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "full" => Ok(ReviewType::Full),
            "quick-syntax" | "quick" | "syntax" => Ok(ReviewType::QuickSyntax),
            "security-only" | "security" => Ok(ReviewType::SecurityOnly),
            other => Err(format!(
                "Unknown review type '{}'. Valid types: full, quick-syntax, security-only",
                other
            )),
        }
    }
}

impl fmt::Display for ReviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewType::Full => write!(f, "full"),
            ReviewType::QuickSyntax => write!(f, "quick-syntax"),
            ReviewType::SecurityOnly => write!(f, "security-only"),
        }
    }
}

/// A source-code submission. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    source_text: String,
    language: Language,
    review_type: ReviewType,
    filename: Option<String>,
}

impl Submission {
    pub fn new(source_text: impl Into<String>, language: Language) -> Self {
        Self {
            source_text: source_text.into(),
            language,
            review_type: ReviewType::Full,
            filename: None,
        }
    }

    pub fn with_review_type(mut self, review_type: ReviewType) -> Self {
        self.review_type = review_type;
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn review_type(&self) -> ReviewType {
        self.review_type
    }

    /// Filename for history, falling back to a language-appropriate default
    pub fn filename(&self) -> String {
        match &self.filename {
            Some(name) => name.clone(),
            None => format!("snippet.{}", default_extension(&self.language)),
        }
    }
}

fn default_extension(language: &Language) -> &'static str {
    match language {
        Language::Python => "py",
        Language::JavaScript => "js",
        Language::TypeScript => "ts",
        Language::Java => "java",
        Language::Cpp => "cpp",
        Language::C => "c",
        Language::Rust => "rs",
        Language::Go => "go",
        Language::CSharp => "cs",
        Language::Unsupported(_) => "txt",
    }
}

/// Severity of a finding. Ordering: `Suggestion < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Suggestion,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "Error"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Suggestion => write!(f, "Suggestion"),
        }
    }
}

/// The five quality dimensions a finding can count against
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricCategory {
    Accuracy,
    Readability,
    Performance,
    BestPractices,
    Security,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 5] = [
        MetricCategory::Accuracy,
        MetricCategory::Readability,
        MetricCategory::Performance,
        MetricCategory::BestPractices,
        MetricCategory::Security,
    ];

    /// Human-readable name used in summaries
    pub fn label(&self) -> &'static str {
        match self {
            MetricCategory::Accuracy => "accuracy",
            MetricCategory::Readability => "readability",
            MetricCategory::Performance => "performance",
            MetricCategory::BestPractices => "best practices",
            MetricCategory::Security => "security",
        }
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Detector class, used to narrow a run by review type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorClass {
    Syntax,
    Security,
    Quality,
}

/// One detected issue, line-attributed and severity-tagged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    pub kind: Severity,
    /// 1-based line, within `[1, lineCount]`
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_end: Option<u32>,
    pub message: String,
    pub rule_id: String,
    pub category: MetricCategory,
    /// Detector-declared penalty weight
    pub weight: f64,
    pub auto_fixable: bool,
    /// Identifier the finding is about (variable, parameter), if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    /// Set when the fix synthesizer applied this finding's patch
    #[serde(default)]
    pub resolved: bool,
    /// Why an auto-fixable finding was not patched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unresolved: Option<String>,
}

impl Finding {
    pub fn new(
        rule_id: impl Into<String>,
        kind: Severity,
        line: u32,
        message: impl Into<String>,
        category: MetricCategory,
    ) -> Self {
        let rule_id = rule_id.into();
        let message = message.into();
        Self {
            id: deterministic_finding_id(&rule_id, line, &message),
            kind,
            line,
            line_end: None,
            message,
            rule_id,
            category,
            weight: 1.0,
            auto_fixable: false,
            symbol: None,
            suggested_fix: None,
            resolved: false,
            unresolved: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_line_end(mut self, line_end: u32) -> Self {
        self.line_end = Some(line_end);
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggested_fix = Some(suggestion.into());
        self
    }

    pub fn fixable(mut self, auto_fixable: bool) -> Self {
        self.auto_fixable = auto_fixable;
        self
    }

    /// Move the finding to another line, keeping the ID in sync
    pub fn at_line(mut self, line: u32) -> Self {
        if let Some(end) = self.line_end {
            self.line_end = Some(end.max(line));
        }
        self.line = line;
        self.id = deterministic_finding_id(&self.rule_id, line, &self.message);
        self
    }

    /// Display order: line ascending, then Error > Warning > Suggestion.
    /// Rule and message break remaining ties so the order is total.
    pub fn display_order(a: &Finding, b: &Finding) -> Ordering {
        a.line
            .cmp(&b.line)
            .then_with(|| b.kind.cmp(&a.kind))
            .then_with(|| a.rule_id.cmp(&b.rule_id))
            .then_with(|| a.message.cmp(&b.message))
    }
}

/// Counts of findings by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingCounts {
    pub errors: usize,
    pub warnings: usize,
    pub suggestions: usize,
    pub total: usize,
}

impl FindingCounts {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut counts = Self::default();
        for f in findings {
            match f.kind {
                Severity::Error => counts.errors += 1,
                Severity::Warning => counts.warnings += 1,
                Severity::Suggestion => counts.suggestions += 1,
            }
            counts.total += 1;
        }
        counts
    }
}

/// Five independent quality scores, each in `[0, 100]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub accuracy: u8,
    pub readability: u8,
    pub performance: u8,
    pub best_practices: u8,
    pub security: u8,
}

impl Metrics {
    pub fn perfect() -> Self {
        Self {
            accuracy: 100,
            readability: 100,
            performance: 100,
            best_practices: 100,
            security: 100,
        }
    }

    pub fn get(&self, category: MetricCategory) -> u8 {
        match category {
            MetricCategory::Accuracy => self.accuracy,
            MetricCategory::Readability => self.readability,
            MetricCategory::Performance => self.performance,
            MetricCategory::BestPractices => self.best_practices,
            MetricCategory::Security => self.security,
        }
    }

    pub(crate) fn set(&mut self, category: MetricCategory, value: u8) {
        match category {
            MetricCategory::Accuracy => self.accuracy = value,
            MetricCategory::Readability => self.readability = value,
            MetricCategory::Performance => self.performance = value,
            MetricCategory::BestPractices => self.best_practices = value,
            MetricCategory::Security => self.security = value,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricCategory, u8)> + '_ {
        MetricCategory::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

/// The externally consumed result of one review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    pub score: u8,
    pub summary: String,
    pub metrics: Metrics,
    pub findings: Vec<Finding>,
    pub improved_code: String,
}

/// Run statistics handed to the display layer alongside the result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub structure: StructuralStats,
    pub counts: FindingCounts,
    pub detectors_run: usize,
    pub detectors_failed: usize,
    pub fixes_applied: usize,
    pub fixes_unresolved: usize,
    pub duration_ms: u64,
}

/// History entry wrapping one completed review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub filename: String,
    pub language: Language,
    pub review_type: ReviewType,
    pub score: u8,
    pub timestamp: DateTime<Utc>,
    /// True when the language had no registered grammar or detectors
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_detectors: Vec<String>,
    pub stats: ReviewStats,
    pub result: ReviewResult,
}
