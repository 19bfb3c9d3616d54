use axum::extract::State;
use axum::response::{IntoResponse, Response};

use crate::response::ok;
use crate::state::AppState;

pub(super) async fn global(State(state): State<AppState>) -> Response {
    ok(state.engine().global_stats()).into_response()
}
