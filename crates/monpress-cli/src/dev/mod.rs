pub mod supervisor;
pub mod watcher;

use anyhow::{Context, Result};
use colored::Colorize;
use monpress_router::{Generator, Report};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::commands::generate::run_pass;
use crate::config::{Config, DevConfig};
use supervisor::ServerProcess;
use watcher::{ChangeType, FileChange, RouteWatcher};

const CHANNEL_CAPACITY: usize = 100;

/// Generate once, start the server, then regenerate on every route change
/// until Ctrl-C.
///
/// Passes never overlap: one consumer drains the change channel, and every
/// change queued while a pass runs is folded into the next one.
pub async fn run_dev_loop(config: Config, base_dir: PathBuf) -> Result<()> {
    let generator = config.generator(&base_dir);

    if let Err(e) = generate(&generator).await {
        eprintln!("{} {:#}", "❌".red(), e);
    }

    let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);
    let watcher = RouteWatcher::new(generator.routes_dir(), generator.output(), tx)?;
    println!("  {} Watching: {}", "👀".cyan(), watcher.root().display());

    println!();
    println!("{}", "🚀 Starting server...".green().bold());
    let mut server = ServerProcess::spawn(&config.dev.command, &base_dir)?;
    println!("  {} Press Ctrl+C to stop", "ℹ".cyan());
    println!();

    loop {
        tokio::select! {
            Some(change) = rx.recv() => {
                report_change(&change);
                let coalesced = drain_pending(&mut rx);
                if coalesced > 0 {
                    info!(coalesced, "changes folded into one pass");
                }

                match generate(&generator).await {
                    Ok(report) if needs_restart(&report, &config.dev) => {
                        println!("{} Routes changed, restarting server...", "🔄".yellow());
                        if let Err(e) = server.restart().await {
                            eprintln!("{} {:#}", "❌".red(), e);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => eprintln!("{} {:#}", "❌".red(), e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("{}", "Stopping server...".yellow());
                server.stop().await;
                break;
            }
        }
    }

    Ok(())
}

/// Empties the channel without waiting and returns how many changes were
/// queued. They all fold into the pass that is about to run.
fn drain_pending(rx: &mut mpsc::Receiver<FileChange>) -> usize {
    let mut drained = 0;
    while let Ok(change) = rx.try_recv() {
        debug!(?change, "coalesced into pending pass");
        drained += 1;
    }
    drained
}

/// The server only restarts when the pass actually rewrote the module.
fn needs_restart(report: &Report, dev: &DevConfig) -> bool {
    report.written && dev.restart_on_change
}

/// Runs a pass on the blocking pool; generation is plain file I/O.
async fn generate(generator: &Generator) -> Result<Report> {
    let generator = generator.clone();
    tokio::task::spawn_blocking(move || run_pass(&generator))
        .await
        .context("Generation task failed")?
}

fn report_change(change: &FileChange) {
    match change.change_type {
        ChangeType::Changed => {
            println!("{} Route file changed: {}", "🔄".yellow(), change.path.display());
        }
        ChangeType::Removed => {
            println!("{} Route file removed: {}", "🔄".yellow(), change.path.display());
        }
    }
}
