use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{info, warn};

/// The application server, run as a child process sharing our stdio.
pub struct ServerProcess {
    command: Vec<String>,
    cwd: PathBuf,
    child: Option<Child>,
}

impl ServerProcess {
    /// Start `command` (program first) in `cwd`.
    pub fn spawn(command: &[String], cwd: &Path) -> Result<Self> {
        let mut server = Self {
            command: command.to_vec(),
            cwd: cwd.to_path_buf(),
            child: None,
        };
        server.start()?;
        Ok(server)
    }

    fn start(&mut self) -> Result<()> {
        let (program, args) = self
            .command
            .split_first()
            .context("Dev server command is empty")?;

        let child = Command::new(program)
            .args(args)
            .current_dir(&self.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start `{}`", self.command.join(" ")))?;

        info!(pid = ?child.id(), command = %self.command.join(" "), "server started");
        self.child = Some(child);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    /// Kill the server and wait for it to exit.
    pub async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                warn!("Failed to stop server: {}", e);
            }
        }
    }

    pub async fn restart(&mut self) -> Result<()> {
        self.stop().await;
        self.start()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn command(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_spawn_stop_restart() {
        let mut server = ServerProcess::spawn(&command(&["sleep", "30"]), Path::new(".")).unwrap();
        assert!(server.is_running());

        server.restart().await.unwrap();
        assert!(server.is_running());

        server.stop().await;
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn test_empty_command() {
        assert!(ServerProcess::spawn(&[], Path::new(".")).is_err());
    }

    #[tokio::test]
    async fn test_unknown_program() {
        let result = ServerProcess::spawn(&command(&["monpress-no-such-program"]), Path::new("."));
        assert!(result.is_err());
    }
}
