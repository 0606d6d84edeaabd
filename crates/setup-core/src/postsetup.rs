//! Post-setup actions: dependency install and git
//!
//! Failures here are surfaced to the user but never roll back the files
//! already written; a partially configured project on disk is accepted.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Detect the package manager that invoked us, defaulting to npm
pub fn detect_package_manager() -> String {
    package_manager_from_user_agent(std::env::var("npm_config_user_agent").ok().as_deref())
}

/// Parse a package manager name out of an npm-style user agent string,
/// e.g. "pnpm/9.1.0 npm/? node/v20.11.0 linux x64"
pub fn package_manager_from_user_agent(agent: Option<&str>) -> String {
    let Some(agent) = agent else {
        return "npm".to_string();
    };
    for manager in ["pnpm", "yarn", "bun"] {
        if agent.starts_with(manager) {
            return manager.to_string();
        }
    }
    "npm".to_string()
}

/// Run `<package manager> install` in the project directory
pub async fn install(dir: &Path, package_manager: &str) -> Result<()> {
    let status = Command::new(package_manager)
        .arg("install")
        .current_dir(dir)
        .status()
        .await
        .with_context(|| format!("Failed to run {} install", package_manager))?;

    if !status.success() {
        bail!(
            "{} install exited with code {}",
            package_manager,
            status.code().unwrap_or(-1)
        );
    }
    Ok(())
}

/// Initialize a fresh git repository and stage the starter kit
pub async fn init_git(dir: &Path) -> Result<()> {
    run_git(dir, &["init"]).await?;
    run_git(dir, &["add", "-A"]).await?;
    Ok(())
}

/// Stage and commit the existing repository state so the deployment
/// platform's integration can detect the configuration changes
pub async fn stage_and_commit(dir: &Path) -> Result<()> {
    run_git(dir, &["add", "-A"]).await?;
    run_git(dir, &["commit", "-m", "Configure starter kit"]).await?;
    Ok(())
}

async fn run_git(dir: &Path, args: &[&str]) -> Result<()> {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .context("Failed to run git")?;

    if !status.success() {
        bail!(
            "git {} exited with code {}",
            args.join(" "),
            status.code().unwrap_or(-1)
        );
    }
    Ok(())
}
