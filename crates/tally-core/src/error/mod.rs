//! Error types and result aliases for tally operations.
//!
//! Provides a unified error type that covers all possible error conditions
//! across the tally crates with actionable error messages.

use thiserror::Error;

/// Unified error type for all tally operations
#[derive(Error, Debug)]
pub enum TallyError {
    // Config errors
    #[error("Failed to parse tally.toml: {message}")]
    TomlParse { message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // Registry errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Registry returned status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to parse package listing: {message}")]
    CatalogParse { message: String },

    #[error("Failed to parse metadata for '{name}': {message}")]
    MetadataParse { name: String, message: String },

    #[error("Invalid upload timestamp '{value}'")]
    InvalidTimestamp { value: String },

    // Index errors
    #[error("Package index {index} is out of range for a catalog of {len} packages")]
    UnknownPackageIndex { index: usize, len: usize },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for tally operations
pub type TallyResult<T> = Result<T, TallyError>;

impl TallyError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TallyError::Network { .. } | TallyError::Io { .. })
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            TallyError::Network { .. } => Some("Check your internet connection and try again"),
            TallyError::HttpStatus { .. } => {
                Some("Check the registry URL or try again once the registry is reachable")
            },
            TallyError::ConfigValidation { .. } | TallyError::TomlParse { .. } => {
                Some("Fix tally.toml or the TALLY_* environment variables")
            },
            TallyError::CatalogParse { .. } => {
                Some("Make sure the registry URL points at a simple package index")
            },
            _ => None,
        }
    }
}
