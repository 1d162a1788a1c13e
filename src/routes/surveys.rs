use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;

use crate::dto::survey_dto::{
    CreateQuestion, CreateSurveyPayload, PublishedSurveyDetail, UnpublishedSurveyDetail,
    UpdateTitlePayload,
};
use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::models::question::Question;
use crate::models::survey::SurveySummary;
use crate::AppState;

#[axum::debug_handler]
pub async fn create_survey(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateSurveyPayload>,
) -> Result<impl IntoResponse> {
    let survey = state
        .survey_service
        .create_survey(claims.user_id()?, payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Survey created successfully.", "id": survey.id })),
    ))
}

#[axum::debug_handler]
pub async fn list_published(State(state): State<AppState>) -> Result<Json<Vec<SurveySummary>>> {
    Ok(Json(state.survey_service.list_published().await?))
}

#[axum::debug_handler]
pub async fn published_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PublishedSurveyDetail>> {
    Ok(Json(state.survey_service.published_detail(id).await?))
}

#[axum::debug_handler]
pub async fn my_unpublished(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<SurveySummary>>> {
    let owner = claims.user_id()?;
    Ok(Json(state.survey_service.list_unpublished(owner).await?))
}

#[axum::debug_handler]
pub async fn my_unpublished_detail(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<UnpublishedSurveyDetail>> {
    let owner = claims.user_id()?;
    Ok(Json(state.survey_service.unpublished_detail(owner, id).await?))
}

#[axum::debug_handler]
pub async fn update_title(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTitlePayload>,
) -> Result<impl IntoResponse> {
    state
        .survey_service
        .update_title(claims.user_id()?, id, &payload.title)
        .await?;
    Ok(Json(json!({ "message": "Survey title updated successfully." })))
}

#[axum::debug_handler]
pub async fn publish(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.survey_service.publish(claims.user_id()?, id).await?;
    Ok(Json(json!({ "detail": "Survey published successfully." })))
}

#[axum::debug_handler]
pub async fn add_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateQuestion>,
) -> Result<impl IntoResponse> {
    let question = state
        .survey_service
        .add_question(claims.user_id()?, id, payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Question created successfully.",
            "id": question.id,
            "question_number": question.question_number,
        })),
    ))
}

#[axum::debug_handler]
pub async fn update_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((id, question_id)): Path<(i64, i64)>,
    Json(payload): Json<CreateQuestion>,
) -> Result<Json<Question>> {
    let question = state
        .survey_service
        .update_question(claims.user_id()?, id, question_id, payload)
        .await?;
    Ok(Json(question))
}
