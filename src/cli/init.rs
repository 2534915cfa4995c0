//! Init command - write a critique.toml with default settings

use anyhow::{Context, Result};
use console::style;
use critique::config::CONFIG_FILE_NAME;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# critique configuration

# Per-review time budget in milliseconds
timeout_ms = 10000

# Largest accepted submission in bytes
max_payload_bytes = 1048576

# Auto-fixes applied per line; lower-priority fixes are reported as unresolved
max_auto_fixes_per_line = 1

# Detector worker threads (0 = auto-detect, capped at 16)
workers = 0

# Detector classes to run: all, syntax, security
enabled_detectors = "all"

# Rule IDs that never run (see `critique rules`)
disabled_rules = []

[weights]
# Aggregate score weights; normalized if they do not sum to 1.0
accuracy = 0.30
readability = 0.20
performance = 0.20
best_practices = 0.15
security = 0.15

[penalties]
# Points deducted per finding, before the detector's weight
error = 15.0
warning = 8.0
suggestion = 3.0

[thresholds]
max_line_length = 100
max_nesting = 4
# Functions with shorter bodies are not asked for type hints
min_function_lines = 4
# Comment ratio below the floor costs best-practices points in files of at
# least comment_ratio_min_lines non-blank lines
comment_ratio_floor = 0.05
comment_ratio_min_lines = 30
"#;

/// Run the init command
pub fn run(path: &Path, force: bool) -> Result<()> {
    let dir = path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))?;

    if !dir.is_dir() {
        anyhow::bail!("Path is not a directory: {}", dir.display());
    }

    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() && !force {
        println!(
            "{} Already initialized at {} (use --force to overwrite)",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
        return Ok(());
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| "Failed to create config file")?;
    println!(
        "{} Created {}",
        style("✓").green(),
        style(config_path.display()).cyan()
    );
    println!("\nNext steps:");
    println!("  {} Review a file", style("critique review <FILE>").cyan());
    println!("  {} List rules", style("critique rules").cyan());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use critique::config::ReviewConfig;

    #[test]
    fn test_default_config_matches_defaults() {
        let parsed: ReviewConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(parsed, ReviewConfig::default());
    }

    #[test]
    fn test_init_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "timeout_ms = 5\n").unwrap();
        run(dir.path(), false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "timeout_ms = 5\n");
        run(dir.path(), true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
    }
}
