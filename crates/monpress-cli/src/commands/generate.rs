use anyhow::{Context, Result};
use colored::Colorize;
use monpress_router::{Generator, Report};
use std::path::Path;

use crate::config::{self, Config};

pub fn execute(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let generator = config.generator(config::base_dir(config_path));

    run_pass(&generator)?;
    Ok(())
}

/// Runs one generation pass and reports it on the terminal.
pub fn run_pass(generator: &Generator) -> Result<Report> {
    println!("{}", "♻️  Generating routes...".cyan());

    let report = generator
        .run()
        .with_context(|| format!("Failed to generate routes from {}", generator.routes_dir().display()))?;

    print_report(generator, &report);
    Ok(report)
}

fn print_report(generator: &Generator, report: &Report) {
    if report.disabled > 0 {
        println!(
            "  {} {} route file(s) with invalid paths were emitted disabled",
            "⚠".yellow(),
            report.disabled
        );
    }

    let status = if report.written {
        "written"
    } else {
        "unchanged"
    };
    println!(
        "  {} {} route(s), {} handler(s) -> {} ({})",
        "✓".green(),
        report.routes,
        report.registrations,
        generator.output().display(),
        status
    );
    println!("{}", "🎉 Routes generated".green().bold());
}
