//! # kc-sql-federation
//!
//! Command-line checks for SQL user federation configurations.

#![forbid(unsafe_code)]

use std::process::ExitCode;

use clap::Parser;
use kc_federation_sql_cli::{
    cli::{Cli, Command},
    commands::{exit_status, run_keys, run_user, run_validate, run_verify},
    config::load_component,
    output::error,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Command::Keys = cli.command {
        return finish(run_keys(cli.output).map(|()| true));
    }

    let component = match load_component(&cli.config) {
        Ok(component) => component,
        Err(e) => {
            error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Validate => run_validate(&component, cli.output).await.map(|()| true),
        Command::User(args) => run_user(&component, args, cli.output).await.map(|()| true),
        Command::Verify(args) => run_verify(&component, args, cli.output).await,
        Command::Keys => run_keys(cli.output).map(|()| true),
    };

    finish(result)
}

fn finish(result: kc_federation_sql_cli::CliResult<bool>) -> ExitCode {
    let status = exit_status(&result);
    if let Err(e) = result {
        error(&e.to_string());
    }
    ExitCode::from(status)
}
