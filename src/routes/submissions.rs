use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use crate::dto::submission_dto::{SubmitResponsesRequest, SubmitResponsesResponse};
use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::AppState;

#[axum::debug_handler]
pub async fn submit_responses(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(survey_id): Path<i64>,
    Json(payload): Json<SubmitResponsesRequest>,
) -> Result<(StatusCode, Json<SubmitResponsesResponse>)> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let result = state
        .submission_service
        .submit(user_id, survey_id, payload.responses)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponsesResponse::new(result.message, result.total_score)),
    ))
}
