//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "kc-sql-federation.toml";

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON.
    Json,
}

/// kc-sql-federation - check an SQL user federation configuration.
#[derive(Debug, Parser)]
#[command(name = "kc-sql-federation")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Provider configuration file (TOML).
    #[arg(short, long, env = "KC_SQL_FEDERATION_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check the configuration and connect to the database once.
    Validate,

    /// Look a user and its roles up.
    User(UserArgs),

    /// Check a user's password.
    Verify(VerifyArgs),

    /// List the configuration keys the provider understands.
    Keys,
}

/// How to find the user.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct UserArgs {
    /// Storage id (`f:<component>:<id>` or `<component>:<id>`) or external
    /// id. A `<prefix>:` that is not the component id is part of the id.
    #[arg(long)]
    pub id: Option<String>,

    /// Username.
    #[arg(long)]
    pub username: Option<String>,

    /// Email address.
    #[arg(long)]
    pub email: Option<String>,
}

/// Password check arguments.
#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Storage id (`f:<component>:<id>` or `<component>:<id>`) or external id.
    #[arg(long)]
    pub user_id: String,

    /// Password to check. Read from stdin when omitted.
    #[arg(long, env = "KC_SQL_FEDERATION_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}
