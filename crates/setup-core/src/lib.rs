//! Setup Core - Shared library for starter-kit setup CLIs
//!
//! This library drives the interactive setup flow behind `create-collab-app`:
//! collecting answers, performing browser-based integration handshakes through
//! a single-shot local callback server, materializing the starter-kit
//! template, patching its auth configuration and environment files, and
//! running post-setup actions (install, git).
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - Pure functions and small async operations
//!   for question planning, callback receipt, template download, and patching
//! - **Layer 2: Kit Configuration** - `KitConfig` trait describing a concrete
//!   starter kit (URLs, env keys, auth provider tables)
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based workflow
//!   (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based workflow module

pub mod answers;
pub mod callback;
pub mod integrations;
pub mod kit;
pub mod patch;
pub mod postsetup;
pub mod repo;
pub mod secret;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use answers::{PartialAnswers, Question, SetupAnswers, SetupFlags, SetupOutcome};
pub use callback::{receive_callback, CallbackError, CallbackRepo, IntegrationCallback};
pub use kit::{AuthChoice, KitConfig};
pub use patch::{EnvVar, FileToWrite};

#[cfg(feature = "tui")]
pub use tui::run;
