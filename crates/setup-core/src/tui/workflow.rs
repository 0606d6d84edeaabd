//! The setup workflow: answers -> integrations -> materialize -> patch -> post-setup
//!
//! Data flows strictly forward; every await point is fully resolved before
//! the next step begins. The only shared mutable resources are the target
//! directory and the files-to-write queue, touched by this single task.

use crate::answers::{SetupAnswers, SetupFlags, SetupOutcome};
use crate::callback::CallbackRepo;
use crate::integrations;
use crate::kit::KitConfig;
use crate::patch::{self, EnvVar, FileToWrite};
use crate::postsetup;
use crate::repo;
use crate::secret;
use crate::tui::prompts;
use anyhow::{Context, Result};
use colored::Colorize;

/// Run the full setup flow. The returned outcome is the only place exit
/// behavior is decided; no step calls `process::exit` on its own.
pub async fn run<C: KitConfig>(config: &C, flags: SetupFlags) -> Result<SetupOutcome> {
    cliclack::intro(config.display_name())?;

    let package_manager = flags
        .package_manager
        .clone()
        .unwrap_or_else(postsetup::detect_package_manager);

    let Some(answers) = prompts::collect_answers(config, &flags, &package_manager)? else {
        return Ok(SetupOutcome::Cancelled);
    };

    // An integration was selected but the user declined the browser step.
    // Nothing has been written yet, so this is a plain cancellation.
    if (answers.deploy || answers.secret_import) && !answers.open_browser {
        return Ok(SetupOutcome::Cancelled);
    }

    let app_dir = std::env::current_dir()
        .context("Failed to resolve the current directory")?
        .join(&answers.name);

    if let Err(e) = repo::confirm_directory_empty(&app_dir) {
        cliclack::log::error(format!("{:#}", e))?;
        cliclack::outro("Pick an empty directory and try again.")?;
        return Ok(SetupOutcome::Aborted);
    }

    let session_secret = secret::generate_session_secret();
    let mut secret_value = String::new();
    let mut private_repo: Option<CallbackRepo> = None;

    // === Deploy on the hosted platform, secret key comes back with it ===
    if answers.deploy {
        let spinner = cliclack::spinner();
        spinner.start("Opening the deployment platform, continue there then check back...");
        let data =
            integrations::deploy_integration(config, &answers.name, &session_secret, None).await?;
        secret_value = data.env_value(config.secret_env_key());
        private_repo = data.repo;
        spinner.stop("Deployment set up");
    }

    // === Get the secret key from the general import integration ===
    if answers.secret_import {
        let spinner = cliclack::spinner();
        spinner.start("Opening the secret import page, import your API key then check back...");
        let data = integrations::secret_import_integration(config, None).await?;
        secret_value = data.env_value(config.secret_env_key());
        spinner.stop("Secret key added");
    }

    let env_vars = assemble_env_vars(config, &answers, &secret_value, &session_secret);

    // === Materialize the starter kit ===
    let spinner = cliclack::spinner();
    let materialized = match &private_repo {
        Some(created) => {
            spinner.start("Cloning your new repository...");
            repo::clone_private_repo(created, &app_dir).await?
        }
        None => {
            spinner.start("Downloading the starter kit...");
            repo::download_template(config, &app_dir).await?
        }
    };
    if !materialized {
        spinner.stop("Starter kit is empty");
        cliclack::log::error("The starter kit produced no files; nothing was set up.")?;
        return Ok(SetupOutcome::Aborted);
    }
    spinner.stop("Starter kit ready");

    // === Queue the patched files, then flush in one pass ===
    let mut files: Vec<FileToWrite> = Vec::new();

    let auth_path = app_dir.join(config.auth_file_path());
    let auth_source = tokio::fs::read_to_string(&auth_path)
        .await
        .with_context(|| format!("Failed to read {}", auth_path.display()))?;
    files.push(FileToWrite {
        location: auth_path,
        content: patch::apply_auth_provider(
            &auth_source,
            config.provider_code(&answers.auth),
            config.provider_import(&answers.auth),
        ),
    });

    files.push(FileToWrite {
        location: app_dir.join(".env.local"),
        content: patch::render_env_file(&env_vars),
    });

    let manifest_path = app_dir.join("package.json");
    let manifest_source = tokio::fs::read_to_string(&manifest_path)
        .await
        .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
    files.push(FileToWrite {
        location: manifest_path,
        content: patch::reserialize_manifest(&manifest_source)?,
    });

    patch::flush(&files).await?;

    // === Install and git; failures surface but never roll back ===
    if answers.install {
        let spinner = cliclack::spinner();
        spinner.start(format!("Installing with {}...", package_manager));
        match postsetup::install(&app_dir, &package_manager).await {
            Ok(()) => spinner.stop("Dependencies installed"),
            Err(e) => {
                spinner.stop("Install failed");
                cliclack::log::error(format!("{:#}", e))?;
            }
        }
    }

    if answers.git {
        if let Err(e) = postsetup::init_git(&app_dir).await {
            cliclack::log::error(format!("{:#}", e))?;
        }
    } else if answers.deploy {
        if let Err(e) = postsetup::stage_and_commit(&app_dir).await {
            cliclack::log::error(format!("{:#}", e))?;
        }
    }

    print_next_steps(config, &answers, &package_manager)?;

    Ok(SetupOutcome::Completed)
}

/// Env file entries in their final order: integration secret (when a
/// retrieval flow ran), provider-specific keys, generated session secret
fn assemble_env_vars<C: KitConfig>(
    config: &C,
    answers: &SetupAnswers,
    secret_value: &str,
    session_secret: &str,
) -> Vec<EnvVar> {
    let mut env_vars = Vec::new();
    if answers.deploy || answers.secret_import {
        env_vars.push(EnvVar::new(config.secret_env_key(), secret_value));
    }
    env_vars.extend(config.provider_env(&answers.auth));
    env_vars.push(EnvVar::new(config.session_secret_key(), session_secret));
    env_vars
}

fn print_next_steps<C: KitConfig>(
    config: &C,
    answers: &SetupAnswers,
    package_manager: &str,
) -> Result<()> {
    let run_command = if package_manager == "npm" {
        "npm run".to_string()
    } else {
        package_manager.to_string()
    };

    let mut steps = vec![format!("cd {}", answers.name)];
    if !answers.install {
        steps.push(format!("{} install", package_manager));
    }
    steps.push(format!("{} dev", run_command));

    println!();
    println!(
        "{}",
        format!("Start using the {} by typing:", config.display_name()).bold()
    );
    for (i, step) in steps.iter().enumerate() {
        println!("  {}: {}", i + 1, step.cyan());
    }

    println!();
    if answers.auth != "demo" {
        println!(
            "{}",
            "Read the guide to finish setting up your authentication, and the rest of your app:"
                .bold()
        );
    } else {
        println!("{}", "Read the guide to finish setting up your app:".bold());
    }
    println!("{}", config.guide_url());

    cliclack::outro("Ready to collaborate!")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit::AuthChoice;

    #[derive(Clone)]
    struct TestKit;

    impl KitConfig for TestKit {
        fn name(&self) -> &'static str {
            "test-kit"
        }
        fn display_name(&self) -> &'static str {
            "Test Kit"
        }
        fn default_template_archive_url(&self) -> &'static str {
            "https://example.dev/kit.zip"
        }
        fn template_url_env(&self) -> &'static str {
            "TEST_KIT_TEMPLATE_URL"
        }
        fn deploy_base_url(&self) -> &'static str {
            "https://example.dev/integrations/vercel"
        }
        fn secret_import_base_url(&self) -> &'static str {
            "https://example.dev/integrations/general"
        }
        fn guide_url(&self) -> &'static str {
            "https://example.dev/guide"
        }
        fn secret_env_key(&self) -> &'static str {
            "SECRET_KEY"
        }
        fn session_secret_key(&self) -> &'static str {
            "SESSION_SECRET"
        }
        fn auth_file_path(&self) -> &'static str {
            "pages/api/auth/[...nextauth].ts"
        }
        fn auth_choices(&self) -> &'static [AuthChoice] {
            &[
                AuthChoice {
                    value: "demo",
                    title: "Demo",
                    description: "Add your own authentication later",
                },
                AuthChoice {
                    value: "github",
                    title: "GitHub",
                    description: "Sign in with GitHub",
                },
            ]
        }
        fn provider_code(&self, provider: &str) -> Option<&'static str> {
            match provider {
                "github" => Some("\n    GithubProvider({}),\n"),
                _ => None,
            }
        }
        fn provider_import(&self, provider: &str) -> Option<&'static str> {
            match provider {
                "github" => Some("import GithubProvider from \"x\";"),
                _ => None,
            }
        }
        fn provider_env(&self, provider: &str) -> Vec<EnvVar> {
            match provider {
                "github" => vec![
                    EnvVar::new("GITHUB_CLIENT_ID", ""),
                    EnvVar::new("GITHUB_CLIENT_SECRET", ""),
                ],
                _ => Vec::new(),
            }
        }
    }

    fn answers(auth: &str, deploy: bool, secret_import: bool) -> SetupAnswers {
        SetupAnswers {
            name: "demo".to_string(),
            auth: auth.to_string(),
            deploy,
            secret_import,
            git: true,
            install: false,
            open_browser: false,
            package_manager: "npm".to_string(),
        }
    }

    #[test]
    fn test_env_vars_without_retrieval_hold_only_session_secret() {
        let vars = assemble_env_vars(&TestKit, &answers("demo", false, false), "", "s3ss10n");
        assert_eq!(vars, vec![EnvVar::new("SESSION_SECRET", "s3ss10n")]);
    }

    #[test]
    fn test_env_vars_with_import_lead_with_secret_key() {
        let vars = assemble_env_vars(&TestKit, &answers("github", false, true), "sk_live", "s3");
        assert_eq!(
            vars,
            vec![
                EnvVar::new("SECRET_KEY", "sk_live"),
                EnvVar::new("GITHUB_CLIENT_ID", ""),
                EnvVar::new("GITHUB_CLIENT_SECRET", ""),
                EnvVar::new("SESSION_SECRET", "s3"),
            ]
        );
    }

    #[test]
    fn test_env_vars_with_deploy_keep_empty_secret_line() {
        // Integration never returned the key: proceed with an empty value
        let vars = assemble_env_vars(&TestKit, &answers("demo", true, false), "", "s3");
        assert_eq!(
            vars,
            vec![
                EnvVar::new("SECRET_KEY", ""),
                EnvVar::new("SESSION_SECRET", "s3"),
            ]
        );
    }
}
