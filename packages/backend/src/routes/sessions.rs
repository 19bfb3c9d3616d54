use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::game::PlayRequest;
use crate::response::{ok, AppError};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateSessionRequest {
    session_id: Option<String>,
}

/// `POST /api/sessions`: 201 for a new session, 200 when it already existed.
/// The body is optional.
pub(super) async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let request: CreateSessionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateSessionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::bad_request(format!("invalid request body: {e}")))?
    };

    let (view, created) = state.engine().create_session(request.session_id).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, ok(view)).into_response())
}

pub(super) async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, AppError> {
    let view = state.engine().session_view(&session_id).await?;
    Ok(ok(view).into_response())
}

pub(super) async fn play_round(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    payload: Result<Json<PlayRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload.map_err(|e| AppError::validation(e.body_text()))?;
    let outcome = state.engine().play_round(&session_id, request).await?;
    Ok(ok(outcome).into_response())
}
