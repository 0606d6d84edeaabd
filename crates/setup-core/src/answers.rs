//! Setup answers and question planning
//!
//! The question list is not a mutable prompt chain: `next_question` is a pure
//! decision table over the flags and the answers collected so far. The TUI
//! layer just loops on it, so the same table is what the tests exercise.

/// Externally supplied overrides; any present answer is never prompted
#[derive(Debug, Clone, Default)]
pub struct SetupFlags {
    /// Project directory name
    pub name: Option<String>,

    /// Auth provider id; only honored if the kit offers it
    pub auth: Option<String>,

    /// Deploy on the hosted platform
    pub deploy: Option<bool>,

    /// Retrieve the secret key through the general import flow
    pub secret_import: Option<bool>,

    /// Initialize a new git repository
    pub git: Option<bool>,

    /// Run the package manager install step
    pub install: Option<bool>,

    /// Package manager to use instead of the detected one
    pub package_manager: Option<String>,

    /// Auto-confirm the browser-open step (non-interactive mode)
    pub yes: bool,
}

/// Answers collected so far; filled in one question at a time
#[derive(Debug, Clone, Default)]
pub struct PartialAnswers {
    pub name: Option<String>,
    pub auth: Option<String>,
    pub deploy: Option<bool>,
    pub secret_import: Option<bool>,
    pub git: Option<bool>,
    pub install: Option<bool>,
    pub open_browser: Option<bool>,
}

/// Complete setup answers; immutable once resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupAnswers {
    pub name: String,
    pub auth: String,
    pub deploy: bool,
    pub secret_import: bool,
    pub git: bool,
    pub install: bool,
    pub open_browser: bool,
    pub package_manager: String,
}

/// The questions the setup flow can ask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Question {
    Name,
    Auth,
    Deploy,
    SecretImport,
    Git,
    Install,
    OpenBrowser,
}

/// Overall result of a setup run, propagated to a single top-level exit point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Project created
    Completed,
    /// User cancelled a prompt or declined the browser step; nothing written
    Cancelled,
    /// A precondition failed (occupied directory, empty template); reported,
    /// remaining steps skipped
    Aborted,
}

/// Decide the next question to ask, or `None` when the answers are complete.
///
/// Rules:
/// - an answer supplied by a flag is never prompted
/// - `--auth` only counts if the kit actually offers that provider
/// - deploying implies the secret-import and git questions are settled
/// - the browser confirmation only appears when an integration was selected,
///   and `--yes` stands in for it
pub fn next_question(
    flags: &SetupFlags,
    partial: &PartialAnswers,
    auth_values: &[&str],
) -> Option<Question> {
    if partial.name.is_none() && flags.name.is_none() {
        return Some(Question::Name);
    }

    let flag_auth_offered = flags
        .auth
        .as_deref()
        .is_some_and(|a| auth_values.contains(&a));
    if partial.auth.is_none() && !flag_auth_offered {
        return Some(Question::Auth);
    }

    if partial.deploy.is_none() && flags.deploy.is_none() {
        return Some(Question::Deploy);
    }
    let deploy = partial.deploy.or(flags.deploy).unwrap_or(false);

    // The deploy integration retrieves the secret and commits on its own,
    // so both follow-up questions disappear once deploy is settled.
    if !deploy && partial.secret_import.is_none() && flags.secret_import.is_none() {
        return Some(Question::SecretImport);
    }
    if !deploy && partial.git.is_none() && flags.git.is_none() {
        return Some(Question::Git);
    }

    if partial.install.is_none() && flags.install.is_none() {
        return Some(Question::Install);
    }

    let secret_import = if deploy {
        false
    } else {
        partial.secret_import.or(flags.secret_import).unwrap_or(false)
    };
    if (deploy || secret_import) && partial.open_browser.is_none() && !flags.yes {
        return Some(Question::OpenBrowser);
    }

    None
}

/// Merge flags and collected answers into the final, immutable answer set.
///
/// Total by construction: anything still missing falls back to a safe
/// default, though the planner never lets that happen in practice.
pub fn resolve(
    flags: &SetupFlags,
    partial: PartialAnswers,
    auth_values: &[&str],
    package_manager: &str,
) -> SetupAnswers {
    let deploy = partial.deploy.or(flags.deploy).unwrap_or(false);
    let secret_import = if deploy {
        false
    } else {
        partial.secret_import.or(flags.secret_import).unwrap_or(false)
    };
    let git = if deploy {
        false
    } else {
        partial.git.or(flags.git).unwrap_or(false)
    };

    let flag_auth = flags
        .auth
        .clone()
        .filter(|a| auth_values.contains(&a.as_str()));
    let auth = partial
        .auth
        .or(flag_auth)
        .unwrap_or_else(|| auth_values.first().copied().unwrap_or_default().to_string());

    let open_browser = partial.open_browser.unwrap_or(if deploy || secret_import {
        flags.yes
    } else {
        false
    });

    SetupAnswers {
        name: partial.name.or_else(|| flags.name.clone()).unwrap_or_default(),
        auth,
        deploy,
        secret_import,
        git,
        install: partial.install.or(flags.install).unwrap_or(false),
        open_browser,
        package_manager: flags
            .package_manager
            .clone()
            .unwrap_or_else(|| package_manager.to_string()),
    }
}
