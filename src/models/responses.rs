//! Response DTOs for the bookshop API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::jobs::{JobId, JobStatus};

/// Response body for successful deletions
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// Id of the deleted record
    pub id: u64,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(kind: &str, id: u64) -> Self {
        Self {
            message: format!("{kind} {id} deleted successfully"),
            id,
        }
    }
}

/// Response body for the cache stats endpoint (GET /api/cache/stats)
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    pub capacity: usize,
    pub ttl_ms: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl CacheStatsResponse {
    /// Creates a new CacheStatsResponse from cache statistics
    pub fn new(stats: &CacheStats, capacity: usize, ttl_ms: u64) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
            capacity,
            ttl_ms,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for POST /api/logs/generate
#[derive(Debug, Clone, Serialize)]
pub struct JobSubmittedResponse {
    pub id: JobId,
}

/// Response body for GET /api/logs/status/:id
#[derive(Debug, Clone, Serialize)]
pub struct JobStatusResponse {
    /// The id exactly as requested
    pub id: String,
    pub status: JobStatus,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
