//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use modeltiles::config::ConfigFileError;
use modeltiles::index::FetchError;
use modeltiles::transport::TransportError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to read a source description file
    FileRead { path: PathBuf, error: std::io::Error },
    /// Source description is not valid JSON
    SourceParse { path: PathBuf, error: serde_json::Error },
    /// Failed to create the HTTP transport
    Transport(TransportError),
    /// The source index could not be loaded
    Bootstrap(FetchError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Bootstrap(err) if !err.diagnostics().is_empty() => {
                eprintln!();
                eprintln!("Hints:");
                for diagnostic in err.diagnostics() {
                    eprintln!("  - {}", diagnostic);
                }
            }
            CliError::SourceParse { .. } => {
                eprintln!();
                eprintln!("A source description looks like:");
                eprintln!("  {{\"url\": \"https://example.com/tiles.json\"}}");
                eprintln!("or");
                eprintln!("  {{\"tiles\": [\"https://example.com/{{z}}/{{x}}/{{y}}.glb\"], \"maxzoom\": 16}}");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read '{}': {}", path.display(), error)
            }
            CliError::SourceParse { path, error } => {
                write!(f, "Invalid source description '{}': {}", path.display(), error)
            }
            CliError::Transport(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Bootstrap(e) => write!(f, "Failed to load source index: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::FileRead { error, .. } => Some(error),
            CliError::SourceParse { error, .. } => Some(error),
            CliError::Transport(e) => Some(e),
            CliError::Bootstrap(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<TransportError> for CliError {
    fn from(e: TransportError) -> Self {
        CliError::Transport(e)
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        CliError::Bootstrap(e)
    }
}
