//! Config command - Show and validate the configuration
//!
//! Passwords are always redacted before anything is printed.

use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::Subcommand;
use tracing::info;

use ldapsync_core::config::{Config, ValidationError};

use super::Context;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the configuration with passwords redacted
    Show,
    /// Validate the configuration file
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, context: &Context) -> Result<ExitCode> {
        match self {
            ConfigCommand::Show => execute_show(context),
            ConfigCommand::Validate => execute_validate(context),
        }
    }
}

fn execute_show(context: &Context) -> Result<ExitCode> {
    let formatter = context.formatter();
    let path = &context.config_path;

    let config = Config::load(path)?.redacted();
    info!(config_path = %path.display(), "Showing configuration");

    if context.is_json() {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
    } else {
        formatter.success(&format!("Configuration ({})", path.display()));
        formatter.info("");
        let yaml =
            serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
        for line in yaml.lines() {
            formatter.info(line);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn execute_validate(context: &Context) -> Result<ExitCode> {
    let formatter = context.formatter();
    let path = &context.config_path;

    let errors = match Config::load(path) {
        Ok(config) => config.validate(),
        Err(err) => vec![ValidationError {
            field: "file".to_string(),
            message: format!("{err:#}"),
        }],
    };
    info!(config_path = %path.display(), errors = errors.len(), "Validated configuration");

    if context.is_json() {
        let error_strings: Vec<String> = errors.iter().map(ToString::to_string).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": path.display().to_string(),
            "errors": error_strings,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
        formatter.info(&format!("File: {}", path.display()));
    } else {
        report_errors(context, &errors);
    }

    Ok(if errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Prints validation errors in human form
pub(crate) fn report_errors(context: &Context, errors: &[ValidationError]) {
    let formatter = context.formatter();
    formatter.error(&format!(
        "Configuration has {} error{}:",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" }
    ));
    formatter.info(&format!("File: {}", context.config_path.display()));
    for error in errors {
        formatter.warn(&format!("{} - {}", error.field, error.message));
    }
}
