//! CLI prompts and setup workflow using cliclack (Charm-style inline prompts)
//!
//! This module is optional and only available when the `tui` feature is
//! enabled.

mod prompts;
mod workflow;

pub use workflow::run;
