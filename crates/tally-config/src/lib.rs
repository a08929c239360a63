//! Configuration parsing for tally
//!
//! This crate handles parsing and validation of tally.toml files and layers
//! environment and command line overrides on top, providing one settings
//! value for the registry client and the catalog index.

pub mod merge;
pub mod toml;

// Re-export main types
pub use self::merge::{ConfigLayering, ConfigLoader, ConfigSource};
pub use self::toml::{FetchSection, RegistrySection, TallyToml};

use tally_core::error::TallyError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, TallyError>;
