//! CLI: fetch reservations, sync the calendar, or both.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod store;

pub use cli::{Cli, Command};
pub use config::AppConfig;
pub use error::{CliError, CliResult};
