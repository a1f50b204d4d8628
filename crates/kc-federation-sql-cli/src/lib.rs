//! # kc-federation-sql-cli
//!
//! Operator tool for the SQL user federation provider: validates a
//! provider configuration against its database and runs lookups and
//! password checks through the provider.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::uninlined_format_args)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use error::{CliError, CliResult};
