//! Review command - review one file and render the result

use anyhow::{Context, Result};
use console::style;
use critique::config::load_review_config;
use critique::models::{Language, Review, ReviewType, Submission};
use critique::reporters;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Arguments of `critique review`
#[derive(Debug, Clone)]
pub struct ReviewArgs {
    pub file: PathBuf,
    pub language: Option<String>,
    pub review_type: ReviewType,
    pub format: String,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
    pub workers: Option<usize>,
    pub write_fixed: Option<PathBuf>,
    pub fail_on: Option<String>,
}

/// Run the review command
pub fn run(args: ReviewArgs) -> Result<()> {
    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let language = resolve_language(&args.file, args.language.as_deref());
    let cwd = std::env::current_dir().with_context(|| "Failed to read working directory")?;
    let mut config = load_review_config(args.config.as_deref(), &cwd);
    if let Some(timeout_ms) = args.timeout_ms {
        config = config.with_timeout_ms(timeout_ms);
    }
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    debug!("Effective config: {:?}", config);

    let filename = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.file.display().to_string());
    let submission = Submission::new(source, language)
        .with_review_type(args.review_type)
        .with_filename(filename);

    let review = critique::run_review(&submission, &config)
        .with_context(|| format!("Review of {} failed", args.file.display()))?;

    let output = reporters::report(&review, &args.format)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Report written to: {}",
                style(path.display()).cyan()
            );
        }
        None => println!("{}", output),
    }

    if let Some(path) = &args.write_fixed {
        std::fs::write(path, &review.result.improved_code)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!(
            "{} Improved code written to {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    check_fail_threshold(args.fail_on.as_deref(), &review);
    Ok(())
}

/// Explicit language wins; otherwise infer from the extension, falling back
/// to degraded mode under the extension's name.
fn resolve_language(file: &Path, explicit: Option<&str>) -> Language {
    if let Some(name) = explicit {
        return Language::parse(name);
    }
    let name = file.to_string_lossy();
    Language::from_filename(&name).unwrap_or_else(|| {
        let ext = file
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "text".to_string());
        warn!(
            "Cannot infer a supported language for {}, reviewing as '{}'",
            file.display(),
            ext
        );
        Language::Unsupported(ext)
    })
}

/// Exit with code 1 when findings reach the threshold severity
fn check_fail_threshold(fail_on: Option<&str>, review: &Review) {
    let Some(threshold) = fail_on else {
        return;
    };
    let counts = &review.stats.counts;
    let should_fail = match threshold {
        "error" => counts.errors > 0,
        "warning" => counts.errors > 0 || counts.warnings > 0,
        "suggestion" => counts.total > 0,
        _ => false,
    };
    if should_fail {
        eprintln!("Failing due to --fail-on={} threshold", threshold);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_language() {
        assert_eq!(resolve_language(Path::new("a.py"), None), Language::Python);
        assert_eq!(resolve_language(Path::new("a.py"), Some("js")), Language::JavaScript);
        assert_eq!(
            resolve_language(Path::new("prog.cbl"), None),
            Language::Unsupported("cbl".to_string())
        );
        assert_eq!(
            resolve_language(Path::new("Makefile"), None),
            Language::Unsupported("text".to_string())
        );
    }
}
