//! CLI error types.

use std::fmt;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors surfaced to the command line.
#[derive(Debug)]
pub enum CliError {
    /// Configuration error.
    Config(String),
    /// Portal or calendar provider error.
    Provider(String),
    /// Synchronization error.
    Sync(String),
    /// Reservation file error.
    Data(String),
    /// The fetch retries were exhausted without data.
    NoData,
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Provider(msg) => write!(f, "provider error: {}", msg),
            Self::Sync(msg) => write!(f, "sync error: {}", msg),
            Self::Data(msg) => write!(f, "reservation file error: {}", msg),
            Self::NoData => write!(f, "fetch failed, no reservation data"),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<railsync_providers::ProviderError> for CliError {
    fn from(err: railsync_providers::ProviderError) -> Self {
        Self::Provider(err.to_string())
    }
}

impl From<railsync_sync::SyncError> for CliError {
    fn from(err: railsync_sync::SyncError) -> Self {
        Self::Sync(err.to_string())
    }
}
