//! Kit configuration trait for CLI binaries
//!
//! Each starter kit implements this trait to describe where its template
//! lives, which integration endpoints to open, and how its authentication
//! providers are wired into the template source.

use crate::patch::EnvVar;

/// An authentication method offered by the setup prompt
#[derive(Debug, Clone, Copy)]
pub struct AuthChoice {
    /// Stable identifier used for flags and provider table lookups
    pub value: &'static str,
    /// Title shown in the select prompt
    pub title: &'static str,
    /// One-line description shown next to the title
    pub description: &'static str,
}

/// Configuration trait for a concrete starter kit
///
/// The binary crate supplies the real kit; tests supply stubs. Provider
/// table lookups return `Option` on purpose: an unrecognized provider id
/// degrades to an empty substitution downstream, it is never an error.
pub trait KitConfig: Clone + Send + Sync + 'static {
    /// Internal kit name (used for user agent, env vars)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Default URL of the starter-kit template archive (zip)
    fn default_template_archive_url(&self) -> &'static str;

    /// Environment variable name for overriding the template archive URL
    fn template_url_env(&self) -> &'static str;

    /// Base URL of the deployment platform integration page
    fn deploy_base_url(&self) -> &'static str;

    /// Base URL of the general secret-import integration page
    fn secret_import_base_url(&self) -> &'static str;

    /// URL of the setup guide shown after completion
    fn guide_url(&self) -> &'static str;

    /// Env key of the secret retrieved through integrations
    fn secret_env_key(&self) -> &'static str;

    /// Env key of the generated session-signing secret
    fn session_secret_key(&self) -> &'static str;

    /// Path of the auth-configuration source file, relative to the project
    fn auth_file_path(&self) -> &'static str;

    /// Authentication methods offered by the setup prompt
    fn auth_choices(&self) -> &'static [AuthChoice];

    /// Provider-registration code for the given provider id
    fn provider_code(&self, provider: &str) -> Option<&'static str>;

    /// Import statement replacing the template's default provider import
    fn provider_import(&self, provider: &str) -> Option<&'static str>;

    /// Env entries the given provider needs (empty values, filled in by hand)
    fn provider_env(&self, provider: &str) -> Vec<EnvVar>;

    /// User agent string for HTTP requests
    fn user_agent(&self) -> &'static str {
        self.name()
    }

    /// Template archive URL, honoring the env override
    fn template_archive_url(&self) -> String {
        std::env::var(self.template_url_env())
            .unwrap_or_else(|_| self.default_template_archive_url().to_string())
    }

    /// Provider ids accepted by the `--auth` flag
    fn auth_values(&self) -> Vec<&'static str> {
        self.auth_choices().iter().map(|c| c.value).collect()
    }
}
