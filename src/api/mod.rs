//! API Module
//!
//! HTTP handlers and routing for the bookshop REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /api/cache/stats` - Lookup cache statistics
//! - `GET /api/visits` - Per-path request counts
//! - `/api/authors`, `/api/publishers`, `/api/books` - Catalog CRUD and lookups
//! - `/api/logs` - Daily log filtering and period aggregation jobs

pub mod handlers;
mod middleware;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
