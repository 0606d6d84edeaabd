//! Interactive question loop driven by the pure decision table

use crate::answers::{self, PartialAnswers, Question, SetupAnswers, SetupFlags};
use crate::kit::KitConfig;
use anyhow::Result;

/// Ask the questions the decision table still considers open.
///
/// Returns `None` when the user cancels a prompt; nothing has been written at
/// that point, so the caller just reports the cancellation and exits.
pub fn collect_answers<C: KitConfig>(
    config: &C,
    flags: &SetupFlags,
    package_manager: &str,
) -> Result<Option<SetupAnswers>> {
    let auth_values = config.auth_values();
    let mut partial = PartialAnswers::default();

    while let Some(question) = answers::next_question(flags, &partial, &auth_values) {
        match question {
            Question::Name => {
                let name = cliclack::input("What would you like to name your project directory?")
                    .validate(|input: &String| {
                        if input.trim().is_empty() {
                            Err("Project name is required")
                        } else {
                            Ok(())
                        }
                    })
                    .interact();
                match checked(name)? {
                    Some(name) => partial.name = Some(name),
                    None => return Ok(None),
                }
            }
            Question::Auth => {
                let mut select = cliclack::select(
                    "Which authentication method would you like to use in your project?",
                );
                for choice in config.auth_choices() {
                    select = select.item(choice.value, choice.title, choice.description);
                }
                match checked(select.interact())? {
                    Some(value) => partial.auth = Some(value.to_string()),
                    None => return Ok(None),
                }
            }
            Question::Deploy => {
                match confirm("Would you like to deploy on the hosted platform?")? {
                    Some(deploy) => partial.deploy = Some(deploy),
                    None => return Ok(None),
                }
            }
            Question::SecretImport => {
                match confirm("Would you like to get your secret key automatically (recommended)?")?
                {
                    Some(import) => partial.secret_import = Some(import),
                    None => return Ok(None),
                }
            }
            Question::Git => {
                match confirm("Would you like to initialize a new git repository?")? {
                    Some(git) => partial.git = Some(git),
                    None => return Ok(None),
                }
            }
            Question::Install => {
                match confirm(&format!("Would you like to install with {}?", package_manager))? {
                    Some(install) => partial.install = Some(install),
                    None => return Ok(None),
                }
            }
            Question::OpenBrowser => {
                match confirm("Open browser window to continue set up?")? {
                    Some(open) => partial.open_browser = Some(open),
                    None => return Ok(None),
                }
            }
        }
    }

    Ok(Some(answers::resolve(
        flags,
        partial,
        &auth_values,
        package_manager,
    )))
}

fn confirm(message: &str) -> Result<Option<bool>> {
    checked(cliclack::confirm(message).initial_value(true).interact())
}

/// Map a prompt cancellation to `None`; other I/O errors stay errors
fn checked<T>(result: std::io::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => Ok(None),
        Err(e) => Err(e.into()),
    }
}
