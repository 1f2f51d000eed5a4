mod commands;
mod config;
mod project;

#[cfg(feature = "dev-server")]
mod dev;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "monpress")]
#[command(version, about = "monpress CLI - file-system routes for axum", long_about = None)]
struct Cli {
    /// Path to the project configuration
    #[arg(short, long, global = true, default_value = config::CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the routes module once
    Generate,

    /// Keep the routes module in sync and run the server
    Dev,

    /// Create a new monpress project
    New {
        /// Project name
        name: String,

        /// Skip git initialization
        #[arg(long)]
        no_git: bool,
    },
}

fn main() {
    init_tracing();

    // Parse CLI arguments
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "❌".red(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate => commands::generate::execute(&cli.config),
        Commands::Dev => commands::dev::execute(&cli.config),
        Commands::New { name, no_git } => commands::new::execute(&name, !no_git),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("monpress=info,monpress_router=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
