//! Command implementations.
//!
//! Every command goes through the same factory and provider traits the
//! host uses, so a configuration that passes here behaves the same once
//! saved in the admin console.

use std::io::BufRead;

use kc_federation::{
    ComponentModel, CredentialInput, CredentialInputValidator, UserLookupProvider,
    UserStorageProvider, UserStorageProviderFactory,
};
use kc_federation_sql::SqlUserStorageProviderFactory;
use serde_json::json;

use crate::cli::{OutputFormat, UserArgs, VerifyArgs};
use crate::error::{CliError, CliResult};
use crate::output;

/// Validates the configuration by connecting once.
///
/// ## Errors
///
/// Returns the rejection reported by the factory.
pub async fn run_validate(component: &ComponentModel, format: OutputFormat) -> CliResult<()> {
    let factory = SqlUserStorageProviderFactory::new();
    factory.validate_configuration(component).await?;

    match format {
        OutputFormat::Json => output::json(&json!({ "component": component.id, "valid": true })),
        OutputFormat::Text => {
            output::success(&format!("Configuration of '{}' is valid", component.name));
            Ok(())
        }
    }
}

/// Looks up a user by id, username or email.
///
/// ## Errors
///
/// Returns lookup errors, or `NotFound` when no row matches.
pub async fn run_user(
    component: &ComponentModel,
    args: UserArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let provider = SqlUserStorageProviderFactory::new().create(component)?;

    let (found, key) = match (args.id, args.username, args.email) {
        (Some(id), _, _) => (provider.get_user_by_id(&id).await, id),
        (_, Some(username), _) => (provider.get_user_by_username(&username).await, username),
        (_, _, Some(email)) => (provider.get_user_by_email(&email).await, email),
        (None, None, None) => {
            return Err(CliError::Config(
                "one of --id, --username or --email is required".to_string(),
            ))
        }
    };
    provider.close();

    match found? {
        Some(user) => output::user(&user, format),
        None => Err(CliError::NotFound(key)),
    }
}

/// Checks a password. Returns whether it was accepted.
///
/// ## Errors
///
/// Returns an error if the provider cannot be created or stdin cannot be read.
pub async fn run_verify(
    component: &ComponentModel,
    args: VerifyArgs,
    format: OutputFormat,
) -> CliResult<bool> {
    let provider = SqlUserStorageProviderFactory::new().create(component)?;

    let password = match args.password {
        Some(password) => password,
        None => read_password()?,
    };

    let valid = provider
        .is_valid(&args.user_id, &CredentialInput::password(password))
        .await;
    provider.close();

    match format {
        OutputFormat::Json => output::json(&json!({ "userId": args.user_id, "valid": valid }))?,
        OutputFormat::Text if valid => output::success("Password accepted"),
        OutputFormat::Text => output::error("Password rejected"),
    }
    Ok(valid)
}

/// Lists the configuration keys.
///
/// ## Errors
///
/// Returns an error if JSON output fails.
pub fn run_keys(format: OutputFormat) -> CliResult<()> {
    let factory = SqlUserStorageProviderFactory::new();
    if format == OutputFormat::Text {
        output::info(factory.help_text());
    }
    output::properties(factory.config_properties(), format)
}

/// Exit status for a password check rejected without error.
pub const PASSWORD_REJECTED: u8 = 2;

/// Maps a command outcome to the process exit status.
#[must_use]
pub const fn exit_status(result: &CliResult<bool>) -> u8 {
    match result {
        Ok(true) => 0,
        Ok(false) => PASSWORD_REJECTED,
        Err(_) => 1,
    }
}

fn read_password() -> CliResult<String> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
