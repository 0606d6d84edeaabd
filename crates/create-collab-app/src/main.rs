//! create-collab-app - Set up the CollabKit Next.js starter kit

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use setup_core::{AuthChoice, EnvVar, KitConfig, SetupFlags, SetupOutcome};

/// CollabKit starter-kit configuration
#[derive(Clone)]
pub struct CollabKit;

const AUTH_CHOICES: &[AuthChoice] = &[
    AuthChoice {
        value: "demo",
        title: "Demo",
        description: "Add your own authentication later",
    },
    AuthChoice {
        value: "github",
        title: "GitHub",
        description: "Sign in with GitHub (instructions in guide)",
    },
    AuthChoice {
        value: "auth0",
        title: "Auth0",
        description: "Sign in with Auth0 (instructions in guide)",
    },
];

const GITHUB_PROVIDER_CODE: &str = r#"
    GithubProvider({
      clientId: process.env.GITHUB_CLIENT_ID,
      clientSecret: process.env.GITHUB_CLIENT_SECRET,
    }),
"#;

const AUTH0_PROVIDER_CODE: &str = r#"
    Auth0Provider({
      clientId: process.env.AUTH0_CLIENT_ID,
      clientSecret: process.env.AUTH0_CLIENT_SECRET,
      issuer: process.env.AUTH0_ISSUER_BASE_URL,
    }),
"#;

impl KitConfig for CollabKit {
    fn name(&self) -> &'static str {
        "create-collab-app"
    }

    fn display_name(&self) -> &'static str {
        "Next.js Starter Kit"
    }

    fn default_template_archive_url(&self) -> &'static str {
        "https://codeload.github.com/collabkit-dev/nextjs-starter-kit/zip/refs/heads/main"
    }

    fn template_url_env(&self) -> &'static str {
        "CREATE_COLLAB_APP_TEMPLATE_URL"
    }

    fn deploy_base_url(&self) -> &'static str {
        "https://collabkit.dev/integrations/vercel"
    }

    fn secret_import_base_url(&self) -> &'static str {
        "https://collabkit.dev/integrations/general"
    }

    fn guide_url(&self) -> &'static str {
        "https://collabkit.dev/docs/guides/nextjs-starter-kit"
    }

    fn secret_env_key(&self) -> &'static str {
        "COLLABKIT_SECRET_KEY"
    }

    fn session_secret_key(&self) -> &'static str {
        // https://next-auth.js.org/configuration/options#secret
        "NEXTAUTH_SECRET"
    }

    fn auth_file_path(&self) -> &'static str {
        "pages/api/auth/[...nextauth].ts"
    }

    fn auth_choices(&self) -> &'static [AuthChoice] {
        AUTH_CHOICES
    }

    fn provider_code(&self, provider: &str) -> Option<&'static str> {
        // The demo setup leaves the provider list empty: authentication is
        // added by hand later, per the guide.
        match provider {
            "demo" => Some(""),
            "github" => Some(GITHUB_PROVIDER_CODE),
            "auth0" => Some(AUTH0_PROVIDER_CODE),
            _ => None,
        }
    }

    fn provider_import(&self, provider: &str) -> Option<&'static str> {
        match provider {
            "demo" => Some("import CredentialsProvider from \"next-auth/providers/credentials\";"),
            "github" => Some("import GithubProvider from \"next-auth/providers/github\";"),
            "auth0" => Some("import Auth0Provider from \"next-auth/providers/auth0\";"),
            _ => None,
        }
    }

    fn provider_env(&self, provider: &str) -> Vec<EnvVar> {
        match provider {
            "github" => vec![
                EnvVar::new("GITHUB_CLIENT_ID", ""),
                EnvVar::new("GITHUB_CLIENT_SECRET", ""),
            ],
            "auth0" => vec![
                EnvVar::new("AUTH0_CLIENT_ID", ""),
                EnvVar::new("AUTH0_CLIENT_SECRET", ""),
                EnvVar::new("AUTH0_ISSUER_BASE_URL", ""),
            ],
            _ => Vec::new(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "create-collab-app")]
#[command(about = "Set up the CollabKit Next.js starter kit")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new starter-kit project
    Create(CliCreateArgs),
}

#[derive(Parser, Debug)]
pub struct CliCreateArgs {
    /// Project directory name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Authentication provider (demo, github, auth0)
    #[arg(short, long)]
    pub auth: Option<String>,

    /// Deploy on the hosted platform (true/false)
    #[arg(long)]
    pub deploy: Option<bool>,

    /// Retrieve the secret key through the import integration (true/false)
    #[arg(long)]
    pub secret: Option<bool>,

    /// Initialize a new git repository (true/false)
    #[arg(long)]
    pub git: Option<bool>,

    /// Run the package manager install step (true/false)
    #[arg(long)]
    pub install: Option<bool>,

    /// Package manager to use instead of the detected one
    #[arg(short, long)]
    pub package_manager: Option<String>,

    /// Auto-confirm the browser-open step (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl From<CliCreateArgs> for SetupFlags {
    fn from(args: CliCreateArgs) -> Self {
        SetupFlags {
            name: args.name,
            auth: args.auth,
            deploy: args.deploy,
            secret_import: args.secret,
            git: args.git,
            install: args.install,
            package_manager: args.package_manager,
            yes: args.yes,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    let config = CollabKit;

    let flags = match args.command {
        Some(Command::Create(create_args)) => create_args.into(),
        // No subcommand provided, default to interactive create
        None => SetupFlags::default(),
    };

    let result = setup_core::run(&config, flags).await;

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    // The single exit point for the whole flow: cancellation and aborted
    // preconditions leave with a clean status, never an error trace.
    match result? {
        SetupOutcome::Completed | SetupOutcome::Aborted => {}
        SetupOutcome::Cancelled => {
            println!("{}", "Cancelled".red().bold());
            println!();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_offered_provider_has_full_tables() {
        let kit = CollabKit;
        for choice in kit.auth_choices() {
            assert!(kit.provider_code(choice.value).is_some());
            assert!(kit.provider_import(choice.value).is_some());
        }
    }

    #[test]
    fn test_unknown_provider_has_no_table_entries() {
        let kit = CollabKit;
        assert!(kit.provider_code("okta").is_none());
        assert!(kit.provider_import("okta").is_none());
        assert!(kit.provider_env("okta").is_empty());
    }

    #[test]
    fn test_demo_provider_block_is_empty() {
        let kit = CollabKit;
        assert_eq!(kit.provider_code("demo"), Some(""));
        assert!(kit.provider_env("demo").is_empty());
    }

    #[test]
    fn test_create_args_map_onto_flags() {
        let args = CliCreateArgs {
            name: Some("demo".to_string()),
            auth: Some("demo".to_string()),
            deploy: Some(false),
            secret: Some(false),
            git: Some(true),
            install: Some(false),
            package_manager: None,
            yes: false,
        };
        let flags: SetupFlags = args.into();
        assert_eq!(flags.name.as_deref(), Some("demo"));
        assert_eq!(flags.secret_import, Some(false));
        assert_eq!(flags.git, Some(true));
    }
}
