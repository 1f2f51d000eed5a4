// File: src/config.rs
// Purpose: Configuration parsing from monpress.toml

use anyhow::{Context, Result};
use monpress_router::Generator;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "monpress.toml";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub dev: DevConfig,
}

/// Route discovery and generation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingConfig {
    /// Directory holding route files (default: "src/routes")
    #[serde(default = "default_routes_dir")]
    pub routes_dir: String,

    /// Generated module path (default: "src/generated/routes.rs")
    #[serde(default = "default_output")]
    pub output: String,

    /// Route directory as seen from the generated module (default: "../routes")
    #[serde(default = "default_import_root")]
    pub import_root: String,

    /// File extensions scanned for handlers (default: ["rs"])
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

/// `monpress dev` settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DevConfig {
    /// Server command, program first (default: ["cargo", "run"])
    #[serde(default = "default_command")]
    pub command: Vec<String>,

    /// Restart the server after the generated module changes
    #[serde(default = "default_true")]
    pub restart_on_change: bool,
}

// Default values
fn default_routes_dir() -> String {
    "src/routes".to_string()
}

fn default_output() -> String {
    "src/generated/routes.rs".to_string()
}

fn default_import_root() -> String {
    "../routes".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["rs".to_string()]
}

fn default_command() -> Vec<String> {
    vec!["cargo".to_string(), "run".to_string()]
}

fn default_true() -> bool {
    true
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            routes_dir: default_routes_dir(),
            output: default_output(),
            import_root: default_import_root(),
            extensions: default_extensions(),
        }
    }
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            restart_on_change: true,
        }
    }
}

impl Config {
    /// Load configuration from a monpress.toml
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Builds the generator, resolving relative paths against `base_dir`
    /// (the directory holding the config file).
    pub fn generator(&self, base_dir: &Path) -> Generator {
        Generator::new(
            base_dir.join(&self.routing.routes_dir),
            base_dir.join(&self.routing.output),
        )
        .with_import_root(self.routing.import_root.clone())
        .with_extensions(self.routing.extensions.iter().cloned())
    }
}

/// Directory that relative config paths resolve against.
pub fn base_dir(config_path: &Path) -> &Path {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
