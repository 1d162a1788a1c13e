use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    pub question_number: i32,
    pub answer: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SubmitResponsesRequest {
    /// Capped at 500 answers; larger batches are a 400 before any lookup.
    #[serde(default)]
    #[validate(length(max = 500, message = "Too many responses in one submission"))]
    pub responses: Vec<SubmittedAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponsesResponse {
    pub detail: String,
    pub total_score_message: String,
}

impl SubmitResponsesResponse {
    pub fn new(detail: impl Into<String>, total_score: i64) -> Self {
        Self {
            detail: detail.into(),
            total_score_message: format!(
                "Total score of answered objective questions: {}",
                total_score
            ),
        }
    }
}
