mod analytics;
mod drills;
mod error_events;
mod health;
mod items;
mod simulations;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/simulations", simulations::router())
        .nest("/api/error-events", error_events::router())
        .nest("/api/drills", drills::router())
        .nest("/api/analytics", analytics::router())
        .nest("/api/items", items::router())
        .nest("/health", health::router())
        .nest("/api/health", health::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Route not found").into_response()
}
