//! Error types for strata-core.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias using strata-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for staging, confirmation and cascade operations
#[derive(Error, Debug)]
pub enum Error {
    // Structural errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    #[error("Invalid tier: {0}")]
    InvalidTier(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // Storage errors
    #[error("File IO error at {}: {source}", path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupted data in {}: {message}", path.display())]
    CorruptedData { path: PathBuf, message: String },
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Wrap an IO failure with the path it happened at
    pub fn file_io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a corrupted data error
    pub fn corrupted(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::CorruptedData {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Check if this error is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error came from the storage boundary
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::FileIo { .. } | Self::CorruptedData { .. })
    }

    /// Check if this error is about a tier name the caller supplied
    pub fn is_tier(&self) -> bool {
        matches!(self, Self::UnknownTier(_) | Self::InvalidTier(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context() {
        let err = Error::file_io(
            "/tmp/strata/staging.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.is_storage());
        assert!(err.to_string().contains("staging.json"));

        let err = Error::corrupted("index.json", "expected value at line 1");
        assert!(err.is_storage());
        assert!(!err.is_validation());

        let err = Error::UnknownTier("fortnightly".into());
        assert!(err.is_tier());
        assert!(err.to_string().contains("fortnightly"));
    }
}
