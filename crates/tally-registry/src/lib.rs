//! Python package index client for tally
//!
//! This crate provides the I/O edge of tally: an HTTP transport for fetching
//! the simple package listing and per-project JSON metadata, the metadata
//! document types, and the parser that derives a project's earliest upload time.

pub mod api;
pub mod catalog;
pub mod client;
pub mod metadata;
pub mod transport;

// Re-export main types
pub use api::{ProjectMetadata, Release, ReleaseFile};
pub use catalog::{parse_simple_index, CatalogSource};
pub use client::{ClientOptions, RegistryClient, RetryConfig};
pub use metadata::{earliest_timestamp, parse_metadata};
pub use transport::{RegistryUrl, Transport, TransportResponse};

use tally_core::error::TallyError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, TallyError>;
