use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::{Config, CONFIG_FILE};

/// Create a new monpress project structure
pub fn create_project(project_path: &Path) -> Result<()> {
    fs::create_dir_all(project_path).context("Failed to create project directory")?;

    create_directories(project_path)?;
    create_config_files(project_path)?;
    create_initial_routes(project_path)?;
    create_gitignore(project_path)?;
    create_readme(project_path)?;

    // Generate the routes module so the project builds straight away
    Config::default()
        .generator(project_path)
        .run()
        .context("Failed to generate initial routes")?;

    Ok(())
}

fn create_directories(project_path: &Path) -> Result<()> {
    let dirs = ["src/routes/users/[id]", "src/generated"];

    for dir in dirs {
        fs::create_dir_all(project_path.join(dir))
            .with_context(|| format!("Failed to create {} directory", dir))?;
    }

    Ok(())
}

fn create_config_files(project_path: &Path) -> Result<()> {
    fs::write(project_path.join(CONFIG_FILE), generate_monpress_config())
        .with_context(|| format!("Failed to create {}", CONFIG_FILE))?;

    let cargo_config = generate_cargo_toml(project_path);
    fs::write(project_path.join("Cargo.toml"), cargo_config)
        .context("Failed to create Cargo.toml")?;

    fs::write(project_path.join("src/main.rs"), MAIN_RS).context("Failed to create src/main.rs")?;

    fs::write(project_path.join("src/generated/mod.rs"), GENERATED_MOD_RS)
        .context("Failed to create src/generated/mod.rs")?;

    Ok(())
}

const MAIN_RS: &str = r#"mod generated;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    monpress::App::new(generated::routes::router())
        .listen("127.0.0.1:3000")
        .await
}
"#;

const GENERATED_MOD_RS: &str = r#"// Output of `monpress generate` lives in this directory.
pub mod routes;
"#;

const INDEX_ROUTE: &str = r#"// src/routes/index.rs -> /
#![allow(non_snake_case)]

use monpress::{handler, sync, ChainBuilder, Context};

pub fn GET() -> ChainBuilder {
    handler(sync(|ctx: &mut Context, next| {
        ctx.respond("Welcome to monpress!");
        next.proceed()
    }))
}
"#;

const USER_ROUTE: &str = r#"// src/routes/users/[id]/index.rs -> /users/:id
#![allow(non_snake_case)]

use monpress::{handler, sync, ChainBuilder, Context, HttpError, Json, Next, StepResult};
use serde_json::json;

fn require_admin(ctx: &mut Context, next: Next) -> StepResult {
    match ctx.header("x-role") {
        Some("admin") => next.proceed(),
        _ => next.fail(HttpError::forbidden("admins only")),
    }
}

pub fn GET() -> ChainBuilder {
    handler(sync(|ctx: &mut Context, next| {
        let id = ctx.param("id").unwrap_or_default().to_string();
        ctx.respond(Json(json!({ "id": id })));
        next.proceed()
    }))
}

pub fn DELETE() -> ChainBuilder {
    handler(sync(|ctx: &mut Context, next| {
        ctx.respond(monpress::StatusCode::NO_CONTENT);
        next.proceed()
    }))
    .middleware(sync(require_admin))
}
"#;

fn create_initial_routes(project_path: &Path) -> Result<()> {
    let routes = project_path.join("src/routes");

    fs::write(routes.join("index.rs"), INDEX_ROUTE).context("Failed to create index route")?;
    fs::write(routes.join("users/[id]/index.rs"), USER_ROUTE)
        .context("Failed to create users route")?;

    Ok(())
}

fn create_gitignore(project_path: &Path) -> Result<()> {
    let gitignore = r#"# Rust
/target/
**/*.rs.bk
*.pdb

# IDE
.vscode/
.idea/
*.swp
*.swo
*~

# OS
.DS_Store
Thumbs.db

# Environment
.env
.env.local
"#;

    fs::write(project_path.join(".gitignore"), gitignore).context("Failed to create .gitignore")?;

    Ok(())
}

fn create_readme(project_path: &Path) -> Result<()> {
    let name = project_name(project_path);
    let readme = format!(
        r#"# {}

A [monpress](https://crates.io/crates/monpress) application.

## Routes

Every file under `src/routes` is a route. Its path becomes the URL:

| File | URL |
|------|-----|
| `src/routes/index.rs` | `/` |
| `src/routes/users/[id]/index.rs` | `/users/:id` |
| `src/routes/docs/[page_].rs` | `/docs/:page?` |

Export one function per HTTP verb (`GET`, `POST`, `PUT`, `PATCH`, `DELETE`).
Files and directories starting with `_` are ignored.

## Development

```bash
monpress dev       # regenerate routes on change and run the server
monpress generate  # regenerate src/generated/routes.rs once
```
"#,
        name
    );

    fs::write(project_path.join("README.md"), readme).context("Failed to create README.md")?;

    Ok(())
}

fn generate_monpress_config() -> String {
    r#"# monpress configuration

[routing]
routes_dir = "src/routes"
output = "src/generated/routes.rs"
import_root = "../routes"
extensions = ["rs"]

[dev]
command = ["cargo", "run"]
restart_on_change = true
"#
    .to_string()
}

fn generate_cargo_toml(project_path: &Path) -> String {
    format!(
        r#"[package]
name = "{}"
version = "0.1.0"
edition = "2021"

[dependencies]
monpress = "0.1"
tokio = {{ version = "1.0", features = ["full"] }}
serde = {{ version = "1.0", features = ["derive"] }}
serde_json = "1.0"
tracing = "0.1"
tracing-subscriber = {{ version = "0.3", features = ["env-filter"] }}
"#,
        project_name(project_path)
    )
}

fn project_name(project_path: &Path) -> &str {
    project_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("monpress-app")
}
