//! # tally-core
//!
//! Core types and utilities shared across all tally crates.
//!
//! This crate provides:
//! - TallyError enum for unified error handling
//! - Timestamp type with parsing for registry upload times
//! - Calendar date helpers used when bucketing timestamps into report days
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Timestamp, ReportDate)
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{TallyError, TallyResult};
pub use types::{format_report_date, parse_timestamp, report_date, Timestamp};
