//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use blobcache::CacheError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(String),
    /// Cache operation failed
    Cache(CacheError),
    /// No entry exists for the requested key
    NotFound(String),
    /// Failed to read an input file
    FileRead { path: String, error: std::io::Error },
    /// Failed to write an output file
    FileWrite { path: String, error: std::io::Error },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Config(_) = self {
            eprintln!();
            eprintln!("Run 'blobcache config init' to create a default config file,");
            eprintln!("or pass --config with the path to an existing one.");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Cache(e) => write!(f, "Cache operation failed: {}", e),
            CliError::NotFound(key) => write!(f, "No cache entry for key {:?}", key),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read {}: {}", path, error)
            }
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write {}: {}", path, error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Cache(error) => Some(error),
            CliError::FileRead { error, .. } => Some(error),
            CliError::FileWrite { error, .. } => Some(error),
            CliError::Config(_) | CliError::NotFound(_) => None,
        }
    }
}

impl From<CacheError> for CliError {
    fn from(error: CacheError) -> Self {
        CliError::Cache(error)
    }
}
