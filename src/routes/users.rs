use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::dto::user_dto::SignUpPayload;
use crate::error::Result;
use crate::AppState;

#[axum::debug_handler]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpPayload>,
) -> Result<impl IntoResponse> {
    state.user_service.sign_up(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully." })),
    ))
}
