//! Output formatting utilities.

use colored::Colorize;
use kc_federation::{ConfigProperty, FederatedUser};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliResult;

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Prints a value as pretty JSON.
///
/// ## Errors
///
/// Returns an error if the value cannot be serialized.
pub fn json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints a federated user.
///
/// ## Errors
///
/// Returns an error if JSON output fails.
pub fn user(user: &FederatedUser, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => json(user),
        OutputFormat::Text => {
            println!("{}", user.username.bold());
            println!("  id:       {}", user.id);
            println!("  email:    {}", user.email.as_deref().unwrap_or("-"));
            println!("  provider: {}", user.federation_link);
            if user.roles.is_empty() {
                println!("  roles:    -");
            } else {
                println!("  roles:");
                for role in &user.roles {
                    match &role.description {
                        Some(description) => {
                            println!("    - {} ({})", role.name, description.dimmed());
                        }
                        None => println!("    - {}", role.name),
                    }
                }
            }
            Ok(())
        }
    }
}

/// Prints configuration key descriptors.
///
/// ## Errors
///
/// Returns an error if JSON output fails.
pub fn properties(properties: &[ConfigProperty], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => json(properties),
        OutputFormat::Text => {
            for property in properties {
                let mut line = format!("{:<24} {}", property.name.bold(), property.label);
                if let Some(default) = property.default_value {
                    line.push_str(&format!(" [default: {default}]"));
                }
                if !property.options.is_empty() {
                    line.push_str(&format!(" ({})", property.options.join(" | ")));
                }
                if property.secret {
                    line.push_str(&format!(" {}", "secret".yellow()));
                }
                println!("{line}");
                println!("  {}", property.help_text.dimmed());
            }
            Ok(())
        }
    }
}
