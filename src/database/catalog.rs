//! Storage seams for the survey catalog.
//!
//! `CatalogStore` is everything the submission workflow reads and writes;
//! `AuthoringStore` covers registration and survey authoring. Both are
//! implemented by [`PgCatalogStore`](super::postgres::PgCatalogStore) and
//! [`MemoryCatalogStore`](super::memory::MemoryCatalogStore).

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::question::{NewQuestion, Question};
use crate::models::score::Score;
use crate::models::survey::{Survey, SurveySummary};
use crate::models::survey_response::NewSurveyResponse;
use crate::models::user::{NewUser, User};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_user(&self, id: i64) -> Result<Option<User>>;

    async fn get_survey(&self, id: i64) -> Result<Option<Survey>>;

    async fn get_question(&self, id: i64) -> Result<Option<Question>>;

    /// Whether any response row exists for the (user, survey) pair.
    async fn responses_exist(&self, user_id: i64, survey_id: i64) -> Result<bool>;

    async fn get_score(&self, user_id: i64, survey_id: i64) -> Result<Option<Score>>;

    /// Opens the write scope for one submission. Submissions for the same
    /// (user, survey) pair are serialized until the returned handle is
    /// committed or dropped; dropping it discards every staged write.
    async fn begin_submission(&self, user_id: i64, survey_id: i64)
        -> Result<Box<dyn SubmissionTx>>;
}

/// Writes of a single submission. Nothing is visible to other readers until
/// [`SubmissionTx::commit`] succeeds.
#[async_trait]
pub trait SubmissionTx: Send {
    async fn responses_exist(&mut self, user_id: i64, survey_id: i64) -> Result<bool>;

    async fn get_score(&mut self, user_id: i64, survey_id: i64) -> Result<Option<Score>>;

    /// Inserts all rows as one statement and returns the number written.
    async fn bulk_insert(&mut self, responses: Vec<NewSurveyResponse>) -> Result<u64>;

    async fn upsert_score(&mut self, user_id: i64, survey_id: i64, total: i64) -> Result<Score>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SurveyFilter {
    pub created_by: Option<i64>,
    pub is_published: Option<bool>,
}

#[async_trait]
pub trait AuthoringStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Creates the survey unpublished and numbers `questions` from 1 in order.
    async fn create_survey(
        &self,
        owner_id: i64,
        title: &str,
        questions: Vec<NewQuestion>,
    ) -> Result<Survey>;

    async fn list_surveys(&self, filter: SurveyFilter) -> Result<Vec<SurveySummary>>;

    /// Questions of a survey ordered by question number.
    async fn list_questions(&self, survey_id: i64) -> Result<Vec<Question>>;

    async fn update_survey_title(&self, survey_id: i64, title: &str) -> Result<Survey>;

    async fn publish_survey(&self, survey_id: i64) -> Result<Survey>;

    /// Appends a question numbered one past the survey's current maximum.
    /// Fails with `BadRequest` once the survey holds `MAX_QUESTIONS`.
    async fn add_question(&self, survey_id: i64, question: NewQuestion) -> Result<Question>;

    /// Replaces a question's content; its survey and number never change.
    async fn update_question(&self, question_id: i64, question: NewQuestion) -> Result<Question>;
}

pub trait Repository: CatalogStore + AuthoringStore {}

impl<T> Repository for T where T: CatalogStore + AuthoringStore {}

pub(crate) const DUPLICATE_TITLE: &str = "A survey with this title already exists.";
pub(crate) const DUPLICATE_EMAIL: &str = "A user with this email already exists.";

pub const MAX_QUESTIONS: usize = 20;

pub(crate) fn too_many_questions() -> Error {
    Error::BadRequest(format!(
        "A survey can have at most {} questions.",
        MAX_QUESTIONS
    ))
}
