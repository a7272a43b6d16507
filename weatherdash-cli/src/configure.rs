use anyhow::{Context, Result};
use inquire::{Password, PasswordDisplayMode, Text, validator::Validation};
use weatherdash_core::{Config, Location};

/// Prompt for credentials and defaults, then write the config file.
pub fn run() -> Result<()> {
    let mut config = Config::load_file().context("Failed to load existing configuration")?;

    let mut key_prompt = Password::new("WeatherAPI.com API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation();
    if config.weather_api.api_key.is_some() {
        key_prompt = key_prompt.with_help_message("Leave empty to keep the current key");
    }
    let api_key = key_prompt.prompt()?;
    if !api_key.trim().is_empty() {
        config.weather_api.api_key = Some(api_key.trim().to_string());
    }

    let current_backend = config.backend.base_url.clone().unwrap_or_default();
    let backend = Text::new("Prediction backend URL:")
        .with_default(&current_backend)
        .with_help_message(
            "e.g. http://localhost:8000; leave empty to disable predictions and charts",
        )
        .prompt()?;
    config.backend.base_url = match backend.trim() {
        "" => None,
        url => Some(url.to_string()),
    };

    let location = Text::new("Default location:")
        .with_default(&config.location)
        .with_validator(|input: &str| {
            Ok(match Location::new(input) {
                Ok(_) => Validation::Valid,
                Err(e) => Validation::Invalid(e.to_string().into()),
            })
        })
        .prompt()?;
    config.location = location.trim().to_string();

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}
