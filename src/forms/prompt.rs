//! Interactive prompting for form processing.
//!
//! The [`Prompter`] trait abstracts the terminal prompt library so tests
//! can substitute a scripted implementation. The default implementation
//! delegates to dialoguer.

use dialoguer::{Confirm, Input, Password, Select};

use crate::error::{Error, Result};

/// Checks a candidate answer, returning a message when it is rejected.
pub type Validator = Box<dyn Fn(&str) -> std::result::Result<(), String>>;

/// Rejects empty answers; applied when a property is required.
pub(crate) fn required_validator() -> Validator {
    Box::new(|value: &str| {
        if value.is_empty() {
            Err("a value is required".to_string())
        } else {
            Ok(())
        }
    })
}

/// Collects typed answers from the user.
pub trait Prompter {
    fn input(
        &mut self,
        message: &str,
        help: &str,
        default: &str,
        validators: &[Validator],
    ) -> Result<String>;

    fn password(&mut self, message: &str, help: &str, validators: &[Validator])
        -> Result<String>;

    fn select(
        &mut self,
        message: &str,
        help: &str,
        options: &[String],
        default: &str,
    ) -> Result<String>;

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool>;
}

/// The production prompter, backed by dialoguer.
#[derive(Default)]
pub struct DialoguerPrompter;

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self
    }
}

fn with_help(message: &str, help: &str) -> String {
    if help.is_empty() {
        message.to_string()
    } else {
        format!("{} ({})", message, help)
    }
}

fn run_validators(
    validators: &[Validator],
    value: &String,
) -> std::result::Result<(), String> {
    for v in validators {
        v(value)?;
    }
    Ok(())
}

impl Prompter for DialoguerPrompter {
    fn input(
        &mut self,
        message: &str,
        help: &str,
        default: &str,
        validators: &[Validator],
    ) -> Result<String> {
        let mut input = Input::<String>::new()
            .with_prompt(with_help(message, help))
            .allow_empty(true);

        if !default.is_empty() {
            input = input.default(default.to_string());
        }

        if !validators.is_empty() {
            input = input.validate_with(|value: &String| run_validators(validators, value));
        }

        input
            .interact_text()
            .map_err(|e| Error::Prompt(e.to_string()))
    }

    fn password(
        &mut self,
        message: &str,
        help: &str,
        validators: &[Validator],
    ) -> Result<String> {
        // dialoguer renders prompts on stderr, so rejection messages go
        // there too
        loop {
            let ans = Password::new()
                .with_prompt(with_help(message, help))
                .allow_empty_password(true)
                .interact()
                .map_err(|e| Error::Prompt(e.to_string()))?;

            match run_validators(validators, &ans) {
                Ok(()) => return Ok(ans),
                Err(reason) => eprintln!("{}", reason),
            }
        }
    }

    fn select(
        &mut self,
        message: &str,
        help: &str,
        options: &[String],
        default: &str,
    ) -> Result<String> {
        let default_index = options.iter().position(|o| o == default).unwrap_or(0);

        let selection = Select::new()
            .with_prompt(with_help(message, help))
            .items(options)
            .default(default_index)
            .interact()
            .map_err(|e| Error::Prompt(e.to_string()))?;

        Ok(options[selection].clone())
    }

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool> {
        Confirm::new()
            .with_prompt(message)
            .default(default)
            .interact()
            .map_err(|e| Error::Prompt(e.to_string()))
    }
}
