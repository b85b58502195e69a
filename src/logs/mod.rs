//! Log Aggregation Module
//!
//! Merges per-day application log files over a date range in a background
//! job, and serves single-day extracts from the combined log.

mod service;

pub use service::{daily_log_file_name, LogService};

/// Date format used in daily log file names
pub const DATE_FORMAT: &str = "%Y-%m-%d";
