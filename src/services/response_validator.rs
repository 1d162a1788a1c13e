use std::collections::HashSet;

use crate::database::catalog::CatalogStore;
use crate::dto::submission_dto::SubmittedAnswer;
use crate::error::{Error, Result};
use crate::models::question::Question;
use crate::models::survey::Survey;
use crate::models::survey_response::NewSurveyResponse;
use crate::models::user::User;

#[derive(Debug, Clone)]
pub struct ValidatedAnswer {
    pub question: Question,
    pub answer: String,
}

/// A submission whose every answer resolved to a question of `survey`.
#[derive(Debug, Clone)]
pub struct ValidatedBatch {
    pub user: User,
    pub survey: Survey,
    pub answers: Vec<ValidatedAnswer>,
}

impl ValidatedBatch {
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn to_rows(&self) -> Vec<NewSurveyResponse> {
        self.answers
            .iter()
            .map(|a| NewSurveyResponse {
                user_id: self.user.id,
                survey_id: self.survey.id,
                question_id: a.question.id,
                answer: a.answer.clone(),
            })
            .collect()
    }
}

pub struct ResponseValidator<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> ResponseValidator<'a, S>
where
    S: CatalogStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Checks answers in submission order and stops at the first bad one.
    /// A question may be answered at most once per batch.
    pub async fn validate(
        &self,
        user: User,
        survey: Survey,
        submitted: Vec<SubmittedAnswer>,
    ) -> Result<ValidatedBatch> {
        let mut answers = Vec::with_capacity(submitted.len());
        let mut seen = HashSet::with_capacity(submitted.len());

        for item in submitted {
            if !seen.insert(item.question_id) {
                tracing::debug!(
                    question_id = item.question_id,
                    survey_id = survey.id,
                    "question answered twice in one batch"
                );
                return Err(Error::InvalidReference);
            }

            let question = self
                .store
                .get_question(item.question_id)
                .await?
                .ok_or_else(|| {
                    Error::NotFound(format!("Question with ID {} not found.", item.question_id))
                })?;

            if question.survey_id != survey.id || question.question_number != item.question_number
            {
                tracing::debug!(
                    question_id = question.id,
                    survey_id = survey.id,
                    submitted_number = item.question_number,
                    "question does not belong to survey at that position"
                );
                return Err(Error::InvalidReference);
            }

            if question.is_objective() && !question.has_option(&item.answer) {
                return Err(Error::InvalidAnswer);
            }

            answers.push(ValidatedAnswer {
                question,
                answer: item.answer,
            });
        }

        Ok(ValidatedBatch {
            user,
            survey,
            answers,
        })
    }
}
