//! In-process catalog used by the test suites and by `STORE_BACKEND=memory`.
//!
//! The whole state sits behind one async mutex. A submission transaction owns
//! the guard for its lifetime, so submissions are serialized exactly like the
//! advisory lock does on Postgres, and staged rows only land on commit.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::catalog::{
    AuthoringStore, CatalogStore, SubmissionTx, SurveyFilter, too_many_questions, DUPLICATE_EMAIL,
    DUPLICATE_TITLE, MAX_QUESTIONS,
};
use crate::error::{Error, Result};
use crate::models::question::{NewQuestion, Question};
use crate::models::score::Score;
use crate::models::survey::{Survey, SurveySummary};
use crate::models::survey_response::{NewSurveyResponse, SurveyResponse};
use crate::models::user::{NewUser, User};

#[derive(Debug, Default)]
struct MemoryState {
    last_id: i64,
    users: BTreeMap<i64, User>,
    surveys: BTreeMap<i64, Survey>,
    questions: BTreeMap<i64, Question>,
    responses: Vec<SurveyResponse>,
    scores: Vec<Score>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn has_responses(&self, user_id: i64, survey_id: i64) -> bool {
        self.responses
            .iter()
            .any(|r| r.user_id == user_id && r.survey_id == survey_id)
    }

    fn score(&self, user_id: i64, survey_id: i64) -> Option<&Score> {
        self.scores
            .iter()
            .find(|s| s.user_id == user_id && s.survey_id == survey_id)
    }

    fn push_question(&mut self, survey_id: i64, number: i32, q: NewQuestion) -> Question {
        let question = Question {
            id: self.next_id(),
            survey_id,
            question_number: number,
            question: q.question,
            question_type: q.question_type,
            score_of_objective: q.score_of_objective,
            options: q.options,
            correct_answer: q.correct_answer,
        };
        self.questions.insert(question.id, question.clone());
        question
    }
}

#[derive(Clone, Default)]
pub struct MemoryCatalogStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed response rows for a (user, survey) pair, in insertion order.
    pub async fn responses_for(&self, user_id: i64, survey_id: i64) -> Vec<SurveyResponse> {
        let state = self.state.lock().await;
        state
            .responses
            .iter()
            .filter(|r| r.user_id == user_id && r.survey_id == survey_id)
            .cloned()
            .collect()
    }

    pub async fn score_count(&self, user_id: i64, survey_id: i64) -> usize {
        let state = self.state.lock().await;
        state
            .scores
            .iter()
            .filter(|s| s.user_id == user_id && s.survey_id == survey_id)
            .count()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn get_survey(&self, id: i64) -> Result<Option<Survey>> {
        Ok(self.state.lock().await.surveys.get(&id).cloned())
    }

    async fn get_question(&self, id: i64) -> Result<Option<Question>> {
        Ok(self.state.lock().await.questions.get(&id).cloned())
    }

    async fn responses_exist(&self, user_id: i64, survey_id: i64) -> Result<bool> {
        Ok(self.state.lock().await.has_responses(user_id, survey_id))
    }

    async fn get_score(&self, user_id: i64, survey_id: i64) -> Result<Option<Score>> {
        Ok(self.state.lock().await.score(user_id, survey_id).cloned())
    }

    async fn begin_submission(
        &self,
        _user_id: i64,
        _survey_id: i64,
    ) -> Result<Box<dyn SubmissionTx>> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(MemorySubmissionTx {
            state: guard,
            staged_responses: Vec::new(),
            staged_score: None,
        }))
    }
}

pub struct MemorySubmissionTx {
    state: OwnedMutexGuard<MemoryState>,
    staged_responses: Vec<SurveyResponse>,
    staged_score: Option<Score>,
}

impl MemorySubmissionTx {
    fn is_duplicate(&self, r: &NewSurveyResponse) -> bool {
        self.state
            .responses
            .iter()
            .chain(self.staged_responses.iter())
            .any(|e| {
                e.user_id == r.user_id && e.survey_id == r.survey_id && e.question_id == r.question_id
            })
    }
}

#[async_trait]
impl SubmissionTx for MemorySubmissionTx {
    async fn responses_exist(&mut self, user_id: i64, survey_id: i64) -> Result<bool> {
        let staged = self
            .staged_responses
            .iter()
            .any(|r| r.user_id == user_id && r.survey_id == survey_id);
        Ok(staged || self.state.has_responses(user_id, survey_id))
    }

    async fn get_score(&mut self, user_id: i64, survey_id: i64) -> Result<Option<Score>> {
        if let Some(score) = self
            .staged_score
            .as_ref()
            .filter(|s| s.user_id == user_id && s.survey_id == survey_id)
        {
            return Ok(Some(score.clone()));
        }
        Ok(self.state.score(user_id, survey_id).cloned())
    }

    async fn bulk_insert(&mut self, responses: Vec<NewSurveyResponse>) -> Result<u64> {
        // Mirrors the (user, survey, question) unique index: one bad row fails the batch.
        let mut seen = HashSet::new();
        for r in &responses {
            if self.is_duplicate(r) || !seen.insert((r.user_id, r.survey_id, r.question_id)) {
                return Err(Error::AlreadySubmitted);
            }
        }
        let count = responses.len() as u64;
        for r in responses {
            let id = self.state.next_id();
            self.staged_responses.push(SurveyResponse {
                id,
                user_id: r.user_id,
                survey_id: r.survey_id,
                question_id: r.question_id,
                answer: r.answer,
            });
        }
        Ok(count)
    }

    async fn upsert_score(&mut self, user_id: i64, survey_id: i64, total: i64) -> Result<Score> {
        let id = match self.get_score(user_id, survey_id).await? {
            Some(existing) => existing.id,
            None => self.state.next_id(),
        };
        let score = Score {
            id,
            user_id,
            survey_id,
            total_score: total,
        };
        self.staged_score = Some(score.clone());
        Ok(score)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemorySubmissionTx {
            mut state,
            staged_responses,
            staged_score,
        } = *self;

        state.responses.extend(staged_responses);
        if let Some(score) = staged_score {
            match state.scores.iter_mut().find(|s| s.id == score.id) {
                Some(existing) => existing.total_score = score.total_score,
                None => state.scores.push(score),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AuthoringStore for MemoryCatalogStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.lock().await;
        if state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(Error::BadRequest(DUPLICATE_EMAIL.to_string()));
        }
        let created = User {
            id: state.next_id(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn create_survey(
        &self,
        owner_id: i64,
        title: &str,
        questions: Vec<NewQuestion>,
    ) -> Result<Survey> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&owner_id) {
            return Err(Error::NotFound("User not found.".to_string()));
        }
        if state.surveys.values().any(|s| s.title == title) {
            return Err(Error::BadRequest(DUPLICATE_TITLE.to_string()));
        }
        let survey = Survey {
            id: state.next_id(),
            title: title.to_string(),
            created_by: owner_id,
            is_published: false,
            created_time: Utc::now(),
        };
        state.surveys.insert(survey.id, survey.clone());
        for (idx, q) in questions.into_iter().enumerate() {
            state.push_question(survey.id, idx as i32 + 1, q);
        }
        Ok(survey)
    }

    async fn list_surveys(&self, filter: SurveyFilter) -> Result<Vec<SurveySummary>> {
        let state = self.state.lock().await;
        let mut rows: Vec<SurveySummary> = state
            .surveys
            .values()
            .filter(|s| filter.created_by.map_or(true, |owner| s.created_by == owner))
            .filter(|s| filter.is_published.map_or(true, |p| s.is_published == p))
            .map(|s| SurveySummary {
                id: s.id,
                title: s.title.clone(),
                created_by: s.created_by,
                creator_username: state
                    .users
                    .get(&s.created_by)
                    .map(|u| u.username.clone())
                    .unwrap_or_default(),
                is_published: s.is_published,
                created_time: s.created_time,
            })
            .collect();
        rows.sort_by(|a, b| b.created_time.cmp(&a.created_time).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn list_questions(&self, survey_id: i64) -> Result<Vec<Question>> {
        let state = self.state.lock().await;
        let mut rows: Vec<Question> = state
            .questions
            .values()
            .filter(|q| q.survey_id == survey_id)
            .cloned()
            .collect();
        rows.sort_by_key(|q| q.question_number);
        Ok(rows)
    }

    async fn update_survey_title(&self, survey_id: i64, title: &str) -> Result<Survey> {
        let mut state = self.state.lock().await;
        if state
            .surveys
            .values()
            .any(|s| s.id != survey_id && s.title == title)
        {
            return Err(Error::BadRequest(DUPLICATE_TITLE.to_string()));
        }
        let survey = state
            .surveys
            .get_mut(&survey_id)
            .ok_or_else(|| Error::NotFound("Survey not found.".to_string()))?;
        survey.title = title.to_string();
        Ok(survey.clone())
    }

    async fn publish_survey(&self, survey_id: i64) -> Result<Survey> {
        let mut state = self.state.lock().await;
        let survey = state
            .surveys
            .get_mut(&survey_id)
            .ok_or_else(|| Error::NotFound("Survey not found.".to_string()))?;
        survey.is_published = true;
        Ok(survey.clone())
    }

    async fn add_question(&self, survey_id: i64, question: NewQuestion) -> Result<Question> {
        let mut state = self.state.lock().await;
        if !state.surveys.contains_key(&survey_id) {
            return Err(Error::NotFound("Survey not found.".to_string()));
        }
        let numbers: Vec<i32> = state
            .questions
            .values()
            .filter(|q| q.survey_id == survey_id)
            .map(|q| q.question_number)
            .collect();
        if numbers.len() >= MAX_QUESTIONS {
            return Err(too_many_questions());
        }
        let next = numbers.into_iter().max().unwrap_or(0) + 1;
        Ok(state.push_question(survey_id, next, question))
    }

    async fn update_question(&self, question_id: i64, question: NewQuestion) -> Result<Question> {
        let mut state = self.state.lock().await;
        let existing = state
            .questions
            .get_mut(&question_id)
            .ok_or_else(|| Error::NotFound("Question not found.".to_string()))?;
        existing.question = question.question;
        existing.question_type = question.question_type;
        existing.score_of_objective = question.score_of_objective;
        existing.options = question.options;
        existing.correct_answer = question.correct_answer;
        Ok(existing.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionType;

    async fn seeded() -> (MemoryCatalogStore, User, Survey) {
        let store = MemoryCatalogStore::new();
        let user = store
            .create_user(NewUser {
                username: "alice".into(),
                email: "alice@example.com".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap();
        let survey = store
            .create_survey(
                user.id,
                "Lunch",
                vec![NewQuestion {
                    question: "Soup?".into(),
                    question_type: QuestionType::Other,
                    ..Default::default()
                }],
            )
            .await
            .unwrap();
        (store, user, survey)
    }

    fn row(user: &User, survey: &Survey, question_id: i64) -> NewSurveyResponse {
        NewSurveyResponse {
            user_id: user.id,
            survey_id: survey.id,
            question_id,
            answer: "yes".into(),
        }
    }

    #[tokio::test]
    async fn dropped_transaction_discards_staged_writes() {
        let (store, user, survey) = seeded().await;
        let q = store.list_questions(survey.id).await.unwrap().remove(0);

        let mut tx = store.begin_submission(user.id, survey.id).await.unwrap();
        assert_eq!(tx.bulk_insert(vec![row(&user, &survey, q.id)]).await.unwrap(), 1);
        tx.upsert_score(user.id, survey.id, 3).await.unwrap();
        assert!(tx.responses_exist(user.id, survey.id).await.unwrap());
        drop(tx);

        assert!(store.responses_for(user.id, survey.id).await.is_empty());
        assert!(store.get_score(user.id, survey.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn commit_publishes_rows_and_score_together() {
        let (store, user, survey) = seeded().await;
        let q = store.list_questions(survey.id).await.unwrap().remove(0);

        let mut tx = store.begin_submission(user.id, survey.id).await.unwrap();
        tx.bulk_insert(vec![row(&user, &survey, q.id)]).await.unwrap();
        tx.upsert_score(user.id, survey.id, 7).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.responses_for(user.id, survey.id).await.len(), 1);
        let score = store.get_score(user.id, survey.id).await.unwrap().unwrap();
        assert_eq!(score.total_score, 7);
    }

    #[tokio::test]
    async fn upsert_overwrites_existing_score_in_place() {
        let (store, user, survey) = seeded().await;

        let mut tx = store.begin_submission(user.id, survey.id).await.unwrap();
        let first = tx.upsert_score(user.id, survey.id, 2).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin_submission(user.id, survey.id).await.unwrap();
        let second = tx.upsert_score(user.id, survey.id, 9).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.score_count(user.id, survey.id).await, 1);
        assert_eq!(
            store.get_score(user.id, survey.id).await.unwrap().unwrap().total_score,
            9
        );
    }

    #[tokio::test]
    async fn duplicate_response_rows_fail_the_whole_batch() {
        let (store, user, survey) = seeded().await;
        let q = store.list_questions(survey.id).await.unwrap().remove(0);

        let mut tx = store.begin_submission(user.id, survey.id).await.unwrap();
        let err = tx
            .bulk_insert(vec![row(&user, &survey, q.id), row(&user, &survey, q.id)])
            .await;
        assert!(matches!(err, Err(Error::AlreadySubmitted)));
        assert!(!tx.responses_exist(user.id, survey.id).await.unwrap());
    }

    #[tokio::test]
    async fn questions_are_appended_with_next_number() {
        let (store, _user, survey) = seeded().await;
        let added = store
            .add_question(
                survey.id,
                NewQuestion {
                    question: "Bread?".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(added.question_number, 2);
    }

    #[tokio::test]
    async fn append_stops_at_the_question_cap() {
        let (store, _user, survey) = seeded().await;
        for n in 2..=MAX_QUESTIONS {
            let added = store
                .add_question(
                    survey.id,
                    NewQuestion {
                        question: format!("Q{n}"),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            assert_eq!(added.question_number, n as i32);
        }

        let err = store
            .add_question(
                survey.id,
                NewQuestion {
                    question: "one too many".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        assert_eq!(store.list_questions(survey.id).await.unwrap().len(), MAX_QUESTIONS);
    }

    #[tokio::test]
    async fn survey_titles_are_unique() {
        let (store, user, _survey) = seeded().await;
        let err = store.create_survey(user.id, "Lunch", vec![]).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }
}
