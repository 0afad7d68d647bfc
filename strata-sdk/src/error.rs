//! SDK Error Types
//!
//! Defines error types for the Strata SDK.

use thiserror::Error;

/// SDK Result type alias
pub type SDKResult<T> = Result<T, SDKError>;

/// SDK errors
#[derive(Debug, Error)]
pub enum SDKError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigValidationError),

    /// Engine error (validation, storage, tier lookup)
    #[error(transparent)]
    Core(#[from] strata_core::Error),

    /// Entry not found
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// Invalid operation
    #[error("invalid operation: {message}")]
    InvalidOperation { message: String },

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl SDKError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Create an invalid operation error
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Check if this error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if the caller's input was rejected
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Core(e) => e.is_validation() || e.is_tier(),
            Self::InvalidOperation { .. } | Self::Config(_) => true,
            _ => false,
        }
    }

    /// Check if this error came from the filesystem or a damaged document
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_storage())
    }
}
