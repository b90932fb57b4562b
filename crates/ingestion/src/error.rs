//! Ingestion error types

use std::path::PathBuf;

use contracts::ContractError;
use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// File could not be read or written
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Extension does not map to a known frame format
    #[error("unsupported frame file extension: {extension}")]
    UnsupportedFormat { extension: String },

    /// Content is not valid frame JSON
    #[error("failed to parse frames at line {line}: {message}")]
    ParseFailed {
        /// 1-based line number
        line: usize,
        message: String,
    },

    /// JSON has no encoding for NaN or infinity
    #[error("frame #{index} has a non-finite {field}")]
    NonFiniteValue { index: usize, field: &'static str },

    /// Frames could not be serialized
    #[error("failed to serialize frames: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl IngestionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<IngestionError> for ContractError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::Io { source, .. } => ContractError::Io(source),
            IngestionError::ParseFailed { line, message } => {
                ContractError::frame_parse(line, message)
            }
            other => ContractError::Other(other.to_string()),
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
