//! Starter-kit repository materialization
//!
//! The public template is downloaded as a zip archive and extracted (no git
//! history needed; `git init` happens later if requested). A private repo
//! returned by the deploy integration is cloned with git instead, keeping
//! `.git` so the platform can pick up the follow-up commit.

use crate::callback::CallbackRepo;
use crate::kit::KitConfig;
use anyhow::{bail, Context, Result};
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;
use zip::ZipArchive;

/// Verify the target directory does not exist or is empty.
///
/// Errors here are user-facing and happen before any side effects.
pub fn confirm_directory_empty(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    if !dir.is_dir() {
        bail!("{} already exists and is not a directory", dir.display());
    }
    let occupied = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .next()
        .is_some();
    if occupied {
        bail!("Directory {} already exists and is not empty", dir.display());
    }
    Ok(())
}

/// Download and extract the public starter-kit template.
///
/// Returns `false` when the archive yielded no files; the caller halts the
/// run in that case instead of patching a hollow project.
pub async fn download_template<C: KitConfig>(config: &C, target: &Path) -> Result<bool> {
    let url = config.template_archive_url();
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent())
        .build()
        .unwrap_or_else(|_| reqwest::Client::new());

    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch starter kit archive from {}", url))?;

    if !response.status().is_success() {
        bail!(
            "Failed to fetch starter kit from {}: HTTP {}",
            url,
            response.status()
        );
    }

    let bytes = response.bytes().await?;
    let written = extract_archive(&bytes, target)?;
    Ok(written > 0)
}

/// Clone a private repository created by the deploy integration.
///
/// Returns `false` when the clone failed or produced no files.
pub async fn clone_private_repo(repo: &CallbackRepo, target: &Path) -> Result<bool> {
    let url = repo.clone_url();
    let status = tokio::process::Command::new("git")
        .arg("clone")
        .arg("--quiet")
        .arg(&url)
        .arg(target)
        .status()
        .await
        .context("Failed to run git clone")?;

    if !status.success() {
        return Ok(false);
    }
    Ok(file_count(target) > 0)
}

/// Extract a zip archive into `target`, stripping the single top-level
/// directory GitHub-style archives wrap everything in. Returns the number of
/// files written.
fn extract_archive(zip_bytes: &[u8], target: &Path) -> Result<usize> {
    let mut archive =
        ZipArchive::new(Cursor::new(zip_bytes)).context("Failed to read starter kit archive")?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }

        let full_path = file.name().to_string();
        let relative = match full_path.split_once('/') {
            Some((_, rest)) if !rest.is_empty() => rest.to_string(),
            _ => full_path.clone(),
        };

        // The archive is fetched over the network and its URL is
        // env-overridable; entry names must stay inside the target.
        let Some(safe_relative) = sanitize_entry_path(&relative) else {
            bail!(
                "Starter kit archive entry escapes the target directory: {}",
                full_path
            );
        };

        let target_path = target.join(&safe_relative);
        if let Some(parent) = target_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        std::fs::write(&target_path, &contents)
            .with_context(|| format!("Failed to write file: {}", target_path.display()))?;

        written += 1;
    }

    Ok(written)
}

/// Reject archive entry paths that could land outside the target: parent
/// and root components are refused, `.` components are dropped
fn sanitize_entry_path(relative: &str) -> Option<PathBuf> {
    let mut sanitized = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => sanitized.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(sanitized)
}

/// Count regular files under `dir`, ignoring git metadata
fn file_count(dir: &Path) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options = SimpleFileOptions::default();
            for (path, content) in entries {
                zip.start_file(*path, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    #[test]
    fn test_missing_directory_is_acceptable() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("new-project");
        assert!(confirm_directory_empty(&target).is_ok());
    }

    #[test]
    fn test_empty_directory_is_acceptable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(confirm_directory_empty(dir.path()).is_ok());
    }

    #[test]
    fn test_occupied_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("leftover.txt"), "x").unwrap();
        let err = confirm_directory_empty(dir.path()).unwrap_err();
        assert!(err.to_string().contains("not empty"));
    }

    #[test]
    fn test_extract_strips_top_level_directory() {
        let zip = build_zip(&[
            ("starter-kit-main/package.json", "{}"),
            ("starter-kit-main/pages/index.tsx", "export {}"),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let written = extract_archive(&zip, dir.path()).unwrap();
        assert_eq!(written, 2);
        assert!(dir.path().join("package.json").exists());
        assert!(dir.path().join("pages/index.tsx").exists());
    }

    #[test]
    fn test_escaping_entry_is_rejected() {
        let zip = build_zip(&[
            ("starter-kit-main/package.json", "{}"),
            ("starter-kit-main/../../escaped.txt", "gotcha"),
        ]);
        let outer = tempfile::tempdir().unwrap();
        let target = outer.path().join("target");
        std::fs::create_dir_all(&target).unwrap();

        let err = extract_archive(&zip, &target).unwrap_err();
        assert!(err.to_string().contains("escapes the target directory"));
        // Nothing landed above the target
        assert!(!outer.path().join("escaped.txt").exists());
        assert!(!target.join("escaped.txt").exists());
    }

    #[test]
    fn test_dot_components_are_dropped_not_fatal() {
        let zip = build_zip(&[("starter-kit-main/./pages/index.tsx", "export {}")]);
        let dir = tempfile::tempdir().unwrap();
        let written = extract_archive(&zip, dir.path()).unwrap();
        assert_eq!(written, 1);
        assert!(dir.path().join("pages/index.tsx").exists());
    }

    #[test]
    fn test_empty_archive_yields_zero_files() {
        let zip = build_zip(&[]);
        let dir = tempfile::tempdir().unwrap();
        let written = extract_archive(&zip, dir.path()).unwrap();
        assert_eq!(written, 0);
    }

    #[test]
    fn test_file_count_ignores_git_metadata() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/main").unwrap();
        std::fs::write(dir.path().join("README.md"), "# hi").unwrap();
        assert_eq!(file_count(dir.path()), 1);
    }
}
