//! Rules command - print the rule catalogue

use anyhow::Result;
use console::style;
use critique::config::ReviewConfig;
use critique::detectors::default_detectors;
use critique::fixes::FixSynthesizer;
use critique::models::DetectorClass;

/// Run the rules command
pub fn run() -> Result<()> {
    let config = ReviewConfig::default();
    let fixes = FixSynthesizer::with_default_patches(config.max_auto_fixes_per_line);
    let detectors = default_detectors(&config);

    println!("\n{}\n", style("Rule catalogue").bold());
    println!(
        "  {:<26} {:<9} {:<15} {:<11} {:<4}  {}",
        style("RULE").dim(),
        style("CLASS").dim(),
        style("METRIC").dim(),
        style("SEVERITY").dim(),
        style("FIX").dim(),
        style("DESCRIPTION").dim()
    );

    for d in &detectors {
        let class = match d.class() {
            DetectorClass::Syntax => "syntax",
            DetectorClass::Security => "security",
            DetectorClass::Quality => "quality",
        };
        let fix = if fixes.has_patch(d.name()) { "yes" } else { "-" };
        println!(
            "  {:<26} {:<9} {:<15} {:<11} {:<4}  {}",
            style(d.name()).cyan(),
            class,
            d.category().label(),
            d.severity().to_string(),
            fix,
            d.description()
        );
    }

    println!(
        "\n{} rules. Suppress a line with a `{}` comment.",
        detectors.len(),
        critique::detectors::SUPPRESS_MARKER
    );
    Ok(())
}
