//! Text (terminal) reporter with colors and formatting

use crate::models::{Finding, Review, Severity};
use anyhow::Result;

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Severity colors
fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "\x1b[31m",      // Red
        Severity::Warning => "\x1b[33m",    // Yellow
        Severity::Suggestion => "\x1b[34m", // Blue
    }
}

/// Severity tag
fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "[E]",
        Severity::Warning => "[W]",
        Severity::Suggestion => "[S]",
    }
}

/// Render review as formatted terminal output
pub fn render(review: &Review) -> Result<String> {
    let result = &review.result;
    let mut out = String::new();

    // Header
    out.push_str(&format!(
        "\n{BOLD}Code Review{RESET}  {} ({}, {})\n",
        review.filename, review.language, review.review_type
    ));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Score: {BOLD}{}{RESET}/100  Lines: {}\n",
        format_score(result.score),
        review.stats.structure.line_count
    ));
    out.push_str(&format!("{}\n\n", result.summary));

    for note in &review.notes {
        out.push_str(&format!("\x1b[33mnote:{RESET} {}\n", note));
    }
    if !review.failed_detectors.is_empty() {
        out.push_str(&format!(
            "\x1b[33mnote:{RESET} detectors failed: {}\n",
            review.failed_detectors.join(", ")
        ));
    }
    if !review.notes.is_empty() || !review.failed_detectors.is_empty() {
        out.push('\n');
    }

    // Metrics
    out.push_str(&format!("{BOLD}METRICS{RESET}\n"));
    for (category, value) in result.metrics.iter() {
        out.push_str(&format!(
            "  {:<16} {}  {}\n",
            category.label(),
            format_score(value),
            bar(value)
        ));
    }
    out.push('\n');

    // Findings
    let counts = &review.stats.counts;
    out.push_str(&format!("{BOLD}FINDINGS{RESET} ({} total)\n", counts.total));
    let mut summary_parts = Vec::new();
    if counts.errors > 0 {
        summary_parts.push(format!("\x1b[31m{} errors{RESET}", counts.errors));
    }
    if counts.warnings > 0 {
        summary_parts.push(format!("\x1b[33m{} warnings{RESET}", counts.warnings));
    }
    if counts.suggestions > 0 {
        summary_parts.push(format!("\x1b[34m{} suggestions{RESET}", counts.suggestions));
    }
    if !summary_parts.is_empty() {
        out.push_str(&format!("  {}\n\n", summary_parts.join(" | ")));
    }

    for finding in &result.findings {
        out.push_str(&format_finding(finding));
    }
    if !result.findings.is_empty() {
        out.push('\n');
    }

    // Fixed code
    if review.stats.fixes_applied > 0 {
        out.push_str(&format!(
            "{BOLD}IMPROVED CODE{RESET} ({} fixes applied",
            review.stats.fixes_applied
        ));
        if review.stats.fixes_unresolved > 0 {
            out.push_str(&format!(", {} unresolved", review.stats.fixes_unresolved));
        }
        out.push_str(")\n");
        for (i, line) in result.improved_code.lines().enumerate() {
            out.push_str(&format!("{DIM}{:>4} |{RESET} {}\n", i + 1, line));
        }
        out.push('\n');
    }

    Ok(out)
}

fn format_finding(finding: &Finding) -> String {
    let sev_c = severity_color(finding.kind);
    let mut line = format!(
        "  {DIM}{:>4}{RESET}  {sev_c}{}{RESET}  {}  {DIM}{}{RESET}",
        finding.line,
        severity_tag(finding.kind),
        finding.message,
        finding.rule_id
    );
    if finding.resolved {
        line.push_str(&format!("  \x1b[32mfixed{RESET}"));
    } else if let Some(reason) = &finding.unresolved {
        line.push_str(&format!("  {DIM}(not fixed: {}){RESET}", reason));
    }
    line.push('\n');
    if let Some(fix) = finding.suggested_fix.as_deref().filter(|_| !finding.resolved) {
        line.push_str(&format!("        {DIM}fix: {}{RESET}\n", fix));
    }
    line
}

fn bar(value: u8) -> String {
    let filled = (value as usize + 5) / 10;
    format!(
        "{}{DIM}{}{RESET}",
        "█".repeat(filled),
        "░".repeat(10 - filled.min(10))
    )
}

fn format_score(score: u8) -> String {
    let color = if score >= 80 {
        "\x1b[32m"
    } else if score >= 60 {
        "\x1b[33m"
    } else {
        "\x1b[31m"
    };
    format!("{color}{:>3}{RESET}", score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_review;

    #[test]
    fn test_text_render_sections() {
        let out = render(&test_review()).unwrap();
        assert!(out.contains("Code Review"));
        assert!(out.contains("METRICS"));
        assert!(out.contains("best practices"));
        assert!(out.contains("trailing-whitespace"));
        assert!(out.contains("Focus on improving readability"));
    }

    #[test]
    fn test_bar_width() {
        assert_eq!(bar(100).chars().filter(|c| *c == '█').count(), 10);
        assert_eq!(bar(0).chars().filter(|c| *c == '░').count(), 10);
        assert_eq!(bar(44).chars().filter(|c| *c == '█').count(), 4);
    }
}
