//! Request and Response models for the bookshop API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    AuthorRequest, BookRequest, NameQuery, PeriodQuery, PriceRangeQuery, PublisherRequest,
};
pub use responses::{
    CacheStatsResponse, DeleteResponse, HealthResponse, JobStatusResponse, JobSubmittedResponse,
};
