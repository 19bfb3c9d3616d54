mod health;
mod sessions;
mod stats;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/sessions",
            post(sessions::create_session).fallback(fallback_handler),
        )
        .route(
            "/api/sessions/:session_id",
            get(sessions::get_session).fallback(fallback_handler),
        )
        .route(
            "/api/sessions/:session_id/rounds",
            post(sessions::play_round).fallback(fallback_handler),
        )
        .route(
            "/api/stats/global",
            get(stats::global).fallback(fallback_handler),
        )
        .nest("/health", health::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "route not found").into_response()
}
