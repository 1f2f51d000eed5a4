use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::project::scaffold;

pub fn execute(name: &str, init_git: bool) -> Result<()> {
    println!("{}", "Creating new monpress project...".green().bold());
    println!();

    create(Path::new("."), name, init_git)?;

    println!();
    println!("{}", "Project created successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!("  cd {}", name);
    println!("  monpress dev");
    println!();

    Ok(())
}

fn create(parent: &Path, name: &str, init_git: bool) -> Result<()> {
    if !is_valid_project_name(name) {
        anyhow::bail!("Invalid project name. Use alphanumeric characters, hyphens, and underscores only.");
    }

    let project_path = parent.join(name);
    if project_path.exists() {
        anyhow::bail!("Directory '{}' already exists", name);
    }

    scaffold::create_project(&project_path).context("Failed to create project structure")?;

    println!("  {} Project structure", "✓".green());
    println!("  {} Routes generated", "✓".green());

    if init_git {
        if let Err(e) = init_git_repo(&project_path) {
            println!("  {} Git initialization ({})", "⚠".yellow(), e);
        } else {
            println!("  {} Git repository", "✓".green());
        }
    }

    Ok(())
}

fn is_valid_project_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

fn init_git_repo(path: &Path) -> Result<()> {
    use std::process::Command;

    Command::new("git")
        .arg("init")
        .current_dir(path)
        .output()
        .context("Failed to initialize git repository")?;

    Command::new("git")
        .args(["add", "."])
        .current_dir(path)
        .output()
        .context("Failed to add files to git")?;

    Command::new("git")
        .args(["commit", "-m", "Initial commit"])
        .current_dir(path)
        .output()
        .context("Failed to create initial commit")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_project_names() {
        assert!(is_valid_project_name("my-app"));
        assert!(is_valid_project_name("api_v2"));
        assert!(!is_valid_project_name(""));
        assert!(!is_valid_project_name("my app"));
        assert!(!is_valid_project_name("../escape"));
    }

    #[test]
    fn test_create_without_git() {
        let dir = TempDir::new().unwrap();
        create(dir.path(), "shop", false).unwrap();

        let project = dir.path().join("shop");
        assert!(project.join("src/generated/routes.rs").exists());
        assert!(!project.join(".git").exists());
    }

    #[test]
    fn test_existing_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("taken")).unwrap();

        let err = create(dir.path(), "taken", false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_invalid_name_is_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(create(dir.path(), "bad name", false).is_err());
        assert!(create(dir.path(), "../escape", false).is_err());
    }
}
