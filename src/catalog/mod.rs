//! Catalog Module
//!
//! Authors, publishers and books, with lookups memoized in the shared
//! [`TtlCache`](crate::cache::TtlCache) and invalidated after every write.

pub mod keys;
mod models;
mod repository;
mod service;

pub use models::{Author, Book, CachedValue, Publisher};
pub use repository::Catalog;
pub use service::CatalogService;
