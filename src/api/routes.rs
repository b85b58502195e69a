//! API Routes
//!
//! Configures the Axum router with all bookshop endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::*;
use super::middleware::track_visits;

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - Visit counting: every routed request is recorded in [`AppState::visits`]
///   under its route template
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let authors = Router::new()
        .route("/", get(list_authors).post(create_author))
        .route("/search", get(search_authors))
        .route(
            "/:id",
            get(get_author).put(update_author).delete(delete_author),
        );

    let publishers = Router::new()
        .route("/", get(list_publishers).post(create_publisher))
        .route("/search", get(search_publishers))
        .route("/by-name", get(get_publisher_by_name))
        .route(
            "/:id",
            get(get_publisher)
                .put(update_publisher)
                .delete(delete_publisher),
        );

    let books = Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/bulk", post(create_books_bulk))
        .route("/price-range", get(books_by_price_range))
        .route("/publisher/:publisher_id", get(books_by_publisher))
        .route("/:id", get(get_book).put(update_book).delete(delete_book));

    let logs = Router::new()
        .route("/generate", post(generate_period_log))
        .route("/status/:id", get(job_status))
        .route("/file/:id", get(job_file))
        .route("/:date", get(log_for_date));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/cache/stats", get(cache_stats_handler))
        .route("/api/visits", get(visits_handler))
        .nest("/api/authors", authors)
        .nest("/api/publishers", publishers)
        .nest("/api/books", books)
        .nest("/api/logs", logs)
        .layer(middleware::from_fn_with_state(state.clone(), track_visits))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
