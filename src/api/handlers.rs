//! API Handlers
//!
//! HTTP request handlers for the catalog, cache, visit and log endpoints.
//! Handlers only translate between HTTP and the services; validation and
//! cache bookkeeping live in the services.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::debug;

use crate::cache::TtlCache;
use crate::catalog::{Author, Book, CachedValue, Catalog, CatalogService, Publisher};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::jobs::{JobId, JobStatus, JobTracker};
use crate::logs::LogService;
use crate::models::requests::parse_date;
use crate::models::{
    AuthorRequest, BookRequest, CacheStatsResponse, DeleteResponse, HealthResponse,
    JobStatusResponse, JobSubmittedResponse, NameQuery, PeriodQuery, PriceRangeQuery,
    PublisherRequest,
};
use crate::visits::VisitCounter;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub logs: LogService,
    pub visits: Arc<VisitCounter>,
}

impl AppState {
    pub fn new(catalog: CatalogService, logs: LogService) -> Self {
        Self {
            catalog,
            logs,
            visits: Arc::new(VisitCounter::new()),
        }
    }

    /// Builds the services described by `config` around an existing tracker.
    pub fn from_config(config: &Config, tracker: JobTracker) -> Result<Self> {
        let cache = Arc::new(TtlCache::new(config.cache_capacity, config.cache_ttl()));
        let catalog = CatalogService::new(Arc::new(Catalog::new()), cache);
        let logs = LogService::new(
            config.logs_dir.clone(),
            config.log_file_prefix.clone(),
            config.aggregation_delay(),
            tracker,
        )?;
        Ok(Self::new(catalog, logs))
    }

    pub fn cache(&self) -> &Arc<TtlCache<CachedValue>> {
        self.catalog.cache()
    }
}

// == Service Endpoints ==

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /api/cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let cache = state.cache();
    Json(CacheStatsResponse::new(
        &cache.stats(),
        cache.capacity(),
        cache.ttl().as_millis() as u64,
    ))
}

/// Handler for GET /api/visits
pub async fn visits_handler(State(state): State<AppState>) -> Json<HashMap<String, u64>> {
    Json(state.visits.snapshot())
}

// == Authors ==

pub async fn list_authors(State(state): State<AppState>) -> Json<Vec<Author>> {
    Json(state.catalog.authors().await)
}

pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Author>> {
    Ok(Json(state.catalog.author(id).await?))
}

pub async fn search_authors(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> Result<Json<Vec<Author>>> {
    Ok(Json(state.catalog.search_authors(&query.name).await?))
}

pub async fn create_author(
    State(state): State<AppState>,
    Json(req): Json<AuthorRequest>,
) -> Result<(StatusCode, Json<Author>)> {
    let author = state.catalog.create_author(&req).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

pub async fn update_author(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<AuthorRequest>,
) -> Result<Json<Author>> {
    Ok(Json(state.catalog.update_author(id, &req).await?))
}

pub async fn delete_author(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<DeleteResponse>> {
    state.catalog.delete_author(id).await?;
    Ok(Json(DeleteResponse::new("Author", id)))
}

// == Publishers ==

pub async fn list_publishers(State(state): State<AppState>) -> Json<Vec<Publisher>> {
    Json(state.catalog.publishers().await)
}

pub async fn get_publisher(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Publisher>> {
    Ok(Json(state.catalog.publisher(id).await?))
}

pub async fn get_publisher_by_name(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> Result<Json<Publisher>> {
    Ok(Json(state.catalog.publisher_by_name(&query.name).await?))
}

pub async fn search_publishers(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> Result<Json<Vec<Publisher>>> {
    Ok(Json(state.catalog.search_publishers(&query.name).await?))
}

pub async fn create_publisher(
    State(state): State<AppState>,
    Json(req): Json<PublisherRequest>,
) -> Result<(StatusCode, Json<Publisher>)> {
    let publisher = state.catalog.create_publisher(&req).await?;
    Ok((StatusCode::CREATED, Json(publisher)))
}

pub async fn update_publisher(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<PublisherRequest>,
) -> Result<Json<Publisher>> {
    Ok(Json(state.catalog.update_publisher(id, &req).await?))
}

pub async fn delete_publisher(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<DeleteResponse>> {
    state.catalog.delete_publisher(id).await?;
    Ok(Json(DeleteResponse::new("Publisher", id)))
}

// == Books ==

pub async fn list_books(State(state): State<AppState>) -> Json<Vec<Book>> {
    Json(state.catalog.books().await)
}

pub async fn get_book(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Book>> {
    Ok(Json(state.catalog.book(id).await?))
}

pub async fn books_by_publisher(
    State(state): State<AppState>,
    Path(publisher_id): Path<u64>,
) -> Result<Json<Vec<Book>>> {
    Ok(Json(state.catalog.books_by_publisher(publisher_id).await?))
}

pub async fn books_by_price_range(
    State(state): State<AppState>,
    Query(query): Query<PriceRangeQuery>,
) -> Result<Json<Vec<Book>>> {
    Ok(Json(
        state
            .catalog
            .books_by_price_range(query.min, query.max)
            .await?,
    ))
}

pub async fn create_book(
    State(state): State<AppState>,
    Json(req): Json<BookRequest>,
) -> Result<(StatusCode, Json<Book>)> {
    let book = state.catalog.create_book(&req).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn create_books_bulk(
    State(state): State<AppState>,
    Json(reqs): Json<Vec<BookRequest>>,
) -> Result<(StatusCode, Json<Vec<Book>>)> {
    let books = state.catalog.create_books(&reqs).await?;
    Ok((StatusCode::CREATED, Json(books)))
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<BookRequest>,
) -> Result<Json<Book>> {
    Ok(Json(state.catalog.update_book(id, &req).await?))
}

pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<DeleteResponse>> {
    state.catalog.delete_book(id).await?;
    Ok(Json(DeleteResponse::new("Book", id)))
}

// == Logs ==

/// Handler for GET /api/logs/:date
pub async fn log_for_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<impl IntoResponse> {
    let date = parse_date(&date).map_err(AppError::InvalidRequest)?;
    let body = state.logs.log_for_date(date).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body))
}

/// Handler for POST /api/logs/generate?from=&to=
pub async fn generate_period_log(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<(StatusCode, Json<JobSubmittedResponse>)> {
    let (from, to) = query.parse().map_err(AppError::InvalidRequest)?;
    let id = state.logs.generate_for_period(from, to)?;
    Ok((StatusCode::ACCEPTED, Json(JobSubmittedResponse { id })))
}

/// Handler for GET /api/logs/status/:id
///
/// Ids that were never issued, including malformed ones, report NOT_FOUND.
pub async fn job_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<JobStatusResponse> {
    let status = match id.parse::<JobId>() {
        Ok(job_id) => state.logs.status(job_id),
        Err(_) => {
            debug!(id, "Status requested for malformed job id");
            JobStatus::NotFound
        }
    };
    Json(JobStatusResponse { id, status })
}

/// Handler for GET /api/logs/file/:id
pub async fn job_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let job_id: JobId = id
        .parse()
        .map_err(|_| AppError::NotFound(format!("no log job with id {id}")))?;
    let bytes = state.logs.fetch(job_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"log_{job_id}.txt\""),
            ),
        ],
        bytes,
    ))
}
