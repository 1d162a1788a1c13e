use std::sync::Arc;

use crate::database::catalog::{CatalogStore, SubmissionTx};
use crate::dto::submission_dto::SubmittedAnswer;
use crate::error::{Error, Result};
use crate::services::response_validator::ResponseValidator;
use crate::services::scoring_service::ScoringService;

pub const SUBMITTED_MESSAGE: &str = "Survey responses submitted successfully.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub message: String,
    pub total_score: i64,
}

/// Accepts one response batch per (user, survey), scores it and stores the
/// rows and the score in a single store transaction.
pub struct SubmissionService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for SubmissionService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> SubmissionService<S>
where
    S: CatalogStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn submit(
        &self,
        user_id: i64,
        survey_id: i64,
        responses: Vec<SubmittedAnswer>,
    ) -> Result<SubmissionResult> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| Error::NotFound("User not found.".to_string()))?;
        let survey = self
            .store
            .get_survey(survey_id)
            .await?
            .ok_or_else(|| Error::NotFound("Survey not found.".to_string()))?;

        if self.store.responses_exist(user.id, survey.id).await?
            || self.store.get_score(user.id, survey.id).await?.is_some()
        {
            tracing::info!(user_id, survey_id, "repeat submission rejected");
            return Err(Error::AlreadySubmitted);
        }

        let batch = ResponseValidator::new(self.store.as_ref())
            .validate(user, survey, responses)
            .await?;
        let submitted = batch.len();
        let total_score = ScoringService::score(&batch);

        let mut tx = self.store.begin_submission(user_id, survey_id).await?;

        // The pre-check above ran outside the lock; a racing request may have won.
        if tx.responses_exist(user_id, survey_id).await?
            || tx.get_score(user_id, survey_id).await?.is_some()
        {
            tracing::info!(user_id, survey_id, "concurrent submission rejected");
            return Err(Error::AlreadySubmitted);
        }

        let written = tx.bulk_insert(batch.to_rows()).await?;
        if written != submitted as u64 {
            tracing::error!(
                user_id,
                survey_id,
                submitted,
                written,
                "response write count mismatch, rolling back"
            );
            return Err(Error::Internal(format!(
                "expected {} response rows, wrote {}",
                submitted, written
            )));
        }

        let score = tx.upsert_score(user_id, survey_id, total_score).await?;
        tx.commit().await?;

        tracing::info!(
            user_id,
            survey_id,
            responses = submitted,
            total_score = score.total_score,
            "survey responses submitted"
        );

        Ok(SubmissionResult {
            message: SUBMITTED_MESSAGE.to_string(),
            total_score: score.total_score,
        })
    }
}
