use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SurveyResponse {
    pub id: i64,
    pub user_id: i64,
    pub survey_id: i64,
    pub question_id: i64,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSurveyResponse {
    pub user_id: i64,
    pub survey_id: i64,
    pub question_id: i64,
    pub answer: String,
}
