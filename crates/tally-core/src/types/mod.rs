//! Core data types for tally.
//!
//! This module provides the fundamental types used throughout tally:
//! - Timestamp type for registry upload times
//! - Calendar date helpers for bucketing timestamps into report days

pub mod timestamp;

// Re-export all public types
pub use timestamp::{format_report_date, parse_timestamp, report_date, Timestamp};
