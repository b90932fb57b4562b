//! Layered error definitions
//!
//! Categorized by source: config / frame / io

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Frame Errors =====
    /// Frame rejected before analysis
    #[error("invalid frame #{index} at '{field}': {message}")]
    InvalidFrame {
        index: usize,
        field: String,
        message: String,
    },

    /// Frame file could not be decoded
    #[error("frame parse error at line {line}: {message}")]
    FrameParse { line: usize, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create invalid frame error
    pub fn invalid_frame(index: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFrame {
            index,
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create frame parse error
    pub fn frame_parse(line: usize, message: impl Into<String>) -> Self {
        Self::FrameParse {
            line,
            message: message.into(),
        }
    }
}
