use anyhow::Result;
use colored::Colorize;
use std::path::Path;

#[cfg(feature = "dev-server")]
pub fn execute(config_path: &Path) -> Result<()> {
    use crate::config::{self, Config};
    use crate::dev::run_dev_loop;

    println!("{}", "Preparing development environment...".green().bold());
    println!();

    let config = Config::load(config_path)?;
    let base_dir = config::base_dir(config_path).to_path_buf();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async { run_dev_loop(config, base_dir).await })
}

#[cfg(not(feature = "dev-server"))]
pub fn execute(_config_path: &Path) -> Result<()> {
    println!("{}", "⚠ Dev loop not available".yellow());
    println!();
    println!("The dev loop requires the 'dev-server' feature.");
    println!("Rebuild with: cargo build --features dev-server");
    Ok(())
}
