//! Error types for CLI operations.

use std::path::{Path, PathBuf};

use contracts::ContractError;
use ingestion::IngestionError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Frame or capabilities file could not be read or written
    #[error("Frame file error on {}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: IngestionError,
    },

    /// Configuration or frames rejected by the analysis contracts
    #[error("Analysis of {} failed: {source}", path.display())]
    Analysis {
        path: PathBuf,
        #[source]
        source: ContractError,
    },

    /// Blocking analysis worker panicked or was aborted
    #[error("Analysis worker failed: {message}")]
    Worker { message: String },

    /// Run interrupted by a shutdown signal
    #[error("Analysis cancelled")]
    Cancelled,

    /// Output could not be serialized
    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    /// IO error
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn config_not_found(path: impl AsRef<Path>) -> Self {
        Self::ConfigNotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn input(path: impl AsRef<Path>, source: IngestionError) -> Self {
        Self::Input {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn analysis(path: impl AsRef<Path>, source: ContractError) -> Self {
        Self::Analysis {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker {
            message: message.into(),
        }
    }

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
