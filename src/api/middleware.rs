//! Request middleware

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::handlers::AppState;

/// Counts every routed request against its route template, such as
/// `/api/authors/:id`. Requests that match no route are not counted.
pub async fn track_visits(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(route) = request.extensions().get::<MatchedPath>() {
        let count = state.visits.record(route.as_str());
        debug!(route = route.as_str(), count, "Visit recorded");
    }
    next.run(request).await
}
