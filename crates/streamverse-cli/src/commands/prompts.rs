use color_eyre::eyre::eyre;
use color_eyre::Result;
use dialoguer::{Confirm, Input, Password};

/// Prompt for a string value with optional default
pub fn prompt_string(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(prompt).allow_empty(true);
    if let Some(default_value) = default {
        input = input.default(default_value.to_string());
    }
    input.interact_text().map_err(|e| eyre!("Failed to read input: {}", e))
}

/// Prompt for an email address, re-asking until it looks like one
pub fn prompt_email(prompt: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .validate_with(|value: &String| -> Result<(), &str> {
            if value.contains('@') {
                Ok(())
            } else {
                Err("enter a valid email address")
            }
        })
        .interact_text()
        .map_err(|e| eyre!("Failed to read email: {}", e))
}

/// Prompt for a password (masked input)
pub fn prompt_password(prompt: &str, confirm: bool) -> Result<String> {
    let mut password = Password::new().with_prompt(prompt);
    if confirm {
        password = password.with_confirmation("Repeat password", "Passwords do not match");
    }
    password.interact().map_err(|e| eyre!("Failed to read password: {}", e))
}

/// Prompt for yes/no with optional default
pub fn prompt_yes_no(prompt: &str, default: Option<bool>) -> Result<bool> {
    let mut confirm = Confirm::new().with_prompt(prompt);
    if let Some(default_value) = default {
        confirm = confirm.default(default_value);
    }
    confirm.interact().map_err(|e| eyre!("Failed to read confirmation: {}", e))
}
