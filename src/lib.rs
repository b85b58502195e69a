//! Bookshop - Catalog backend with a bounded lookup cache and async log jobs
//!
//! Catalog lookups are memoized in a small TTL cache with oldest-first
//! eviction. Log aggregation over a date range runs as a tracked background
//! job whose status and output can be polled by id.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod jobs;
pub mod logs;
pub mod models;
pub mod tasks;
pub mod visits;

pub use api::{create_router, AppState};
pub use config::Config;
pub use tasks::spawn_sweep_task;
