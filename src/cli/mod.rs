//! CLI command definitions and handlers

mod init;
mod review;
mod rules;

use anyhow::Result;
use clap::{Parser, Subcommand};
use critique::models::ReviewType;
use std::path::PathBuf;

pub use review::ReviewArgs;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// critique - deterministic code review
#[derive(Parser, Debug)]
#[command(name = "critique")]
#[command(
    version,
    about = "Review a source file: line-attributed findings, five quality metrics, a score and auto-fixed code",
    after_help = "\
Examples:
  critique review app.py                        Full review with terminal output
  critique review app.js --format json          JSON review record for scripting
  critique review main.c --review-type security-only
  critique review app.py --write-fixed app.fixed.py
  critique rules                                List every rule
  critique init                                 Write a critique.toml with defaults"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Review one source file
    Review {
        /// File to review
        file: PathBuf,

        /// Source language (default: inferred from the file extension)
        #[arg(long, short = 'l')]
        language: Option<String>,

        /// Review depth: full, quick-syntax, security-only
        #[arg(long, short = 't', default_value = "full")]
        review_type: ReviewType,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Config file (default: ./critique.toml, then the user config)
        #[arg(long, env = "CRITIQUE_CONFIG")]
        config: Option<PathBuf>,

        /// Time budget in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Number of detector worker threads (1-64)
        #[arg(long, value_parser = parse_workers)]
        workers: Option<usize>,

        /// Write the improved code to this path
        #[arg(long)]
        write_fixed: Option<PathBuf>,

        /// Exit with code 1 if findings at this severity or higher exist
        #[arg(long, value_parser = ["error", "warning", "suggestion"])]
        fail_on: Option<String>,
    },

    /// List the rule catalogue
    Rules,

    /// Write a critique.toml with the default settings
    Init {
        /// Directory to write into
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing critique.toml
        #[arg(long)]
        force: bool,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Review {
            file,
            language,
            review_type,
            format,
            output,
            config,
            timeout_ms,
            workers,
            write_fixed,
            fail_on,
        } => review::run(ReviewArgs {
            file,
            language,
            review_type,
            format,
            output,
            config,
            timeout_ms,
            workers,
            write_fixed,
            fail_on,
        }),

        Commands::Rules => rules::run(),

        Commands::Init { path, force } => init::run(&path, force),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workers() {
        assert_eq!(parse_workers("4"), Ok(4));
        assert!(parse_workers("0").is_err());
        assert!(parse_workers("65").is_err());
        assert!(parse_workers("many").is_err());
    }

    #[test]
    fn test_parse_review_command() {
        let cli = Cli::try_parse_from([
            "critique",
            "review",
            "app.py",
            "--review-type",
            "security-only",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Review {
                file,
                review_type,
                format,
                ..
            } => {
                assert_eq!(file, PathBuf::from("app.py"));
                assert_eq!(review_type, ReviewType::SecurityOnly);
                assert_eq!(format, "json");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["critique", "review", "a.py", "--format", "sarif"]).is_err());
    }
}
