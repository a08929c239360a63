//! Catalog index and growth report engine for tally
//!
//! This crate drives metadata lookups for every project in a catalog under a
//! fixed concurrency cap, keeps per-project outcomes (timestamp, HTTP error,
//! parse error, empty), and folds resolved timestamps into a cumulative,
//! day-bucketed growth report.

pub mod index;
pub mod limiter;
pub mod report;

// Re-export main types
pub use index::{CatalogIndex, IndexSummary, Lookup, DEFAULT_CONCURRENCY};
pub use limiter::ConcurrencyLimiter;
pub use report::{Report, ReportEntry};

use tally_core::error::TallyError;

/// Result type for index operations
pub type IndexResult<T> = Result<T, TallyError>;
