use std::sync::Arc;

use validator::Validate;

use crate::database::catalog::{AuthoringStore, CatalogStore, Repository, SurveyFilter};
use crate::dto::survey_dto::{
    CreateQuestion, CreateSurveyPayload, CreatorView, PublicQuestion, PublishedSurveyDetail,
    UnpublishedSurveyDetail, UpdateTitlePayload, MAX_OPTIONS, MIN_OPTIONS,
};
use crate::error::{Error, Result};
use crate::models::question::{NewQuestion, Question, QuestionType};
use crate::models::survey::{Survey, SurveySummary};

const NOT_FOUND: &str = "Survey not found.";
const NOT_FOUND_OR_PUBLISHED: &str = "Survey not found or it's published.";

#[derive(Clone)]
pub struct SurveyService {
    store: Arc<dyn Repository>,
}

impl SurveyService {
    pub fn new(store: Arc<dyn Repository>) -> Self {
        Self { store }
    }

    pub async fn create_survey(
        &self,
        owner_id: i64,
        mut payload: CreateSurveyPayload,
    ) -> Result<Survey> {
        payload.title = payload.title.trim().to_string();
        payload.validate()?;
        let mut questions = Vec::with_capacity(payload.questions.len());
        for q in payload.questions {
            questions.push(check_question(q)?);
        }

        let survey = self
            .store
            .create_survey(owner_id, &payload.title, questions)
            .await?;
        tracing::info!(survey_id = survey.id, owner_id, "survey created");
        Ok(survey)
    }

    pub async fn list_published(&self) -> Result<Vec<SurveySummary>> {
        self.store
            .list_surveys(SurveyFilter {
                is_published: Some(true),
                ..Default::default()
            })
            .await
    }

    pub async fn published_detail(&self, survey_id: i64) -> Result<PublishedSurveyDetail> {
        let survey = self
            .store
            .get_survey(survey_id)
            .await?
            .filter(|s| s.is_published)
            .ok_or_else(|| Error::NotFound(NOT_FOUND.to_string()))?;
        let creator = self
            .store
            .get_user(survey.created_by)
            .await?
            .ok_or_else(|| Error::Internal(format!("survey {} has no creator", survey.id)))?;
        let questions = self.store.list_questions(survey.id).await?;

        Ok(PublishedSurveyDetail {
            id: survey.id,
            title: survey.title,
            created_time: survey.created_time,
            created_by: CreatorView {
                username: creator.username,
            },
            questions: questions.into_iter().map(PublicQuestion::from).collect(),
        })
    }

    pub async fn list_unpublished(&self, owner_id: i64) -> Result<Vec<SurveySummary>> {
        self.store
            .list_surveys(SurveyFilter {
                created_by: Some(owner_id),
                is_published: Some(false),
            })
            .await
    }

    pub async fn unpublished_detail(
        &self,
        owner_id: i64,
        survey_id: i64,
    ) -> Result<UnpublishedSurveyDetail> {
        let survey = self
            .store
            .get_survey(survey_id)
            .await?
            .filter(|s| s.created_by == owner_id && !s.is_published)
            .ok_or_else(|| Error::NotFound(NOT_FOUND.to_string()))?;
        let questions = self.store.list_questions(survey.id).await?;
        Ok(UnpublishedSurveyDetail {
            id: survey.id,
            title: survey.title,
            questions,
        })
    }

    pub async fn update_title(&self, owner_id: i64, survey_id: i64, title: &str) -> Result<Survey> {
        let payload = UpdateTitlePayload {
            title: title.trim().to_string(),
        };
        payload.validate()?;
        let survey = self.load(survey_id).await?;
        if survey.created_by != owner_id {
            return Err(Error::Forbidden(
                "You are not allowed to edit this survey.".to_string(),
            ));
        }
        if survey.is_published {
            return Err(Error::Forbidden(
                "You are not allowed to edit a published survey.".to_string(),
            ));
        }
        self.store.update_survey_title(survey.id, &payload.title).await
    }

    /// Only unpublished surveys can be published; a second publish is a 404.
    pub async fn publish(&self, owner_id: i64, survey_id: i64) -> Result<Survey> {
        let survey = self
            .store
            .get_survey(survey_id)
            .await?
            .filter(|s| !s.is_published)
            .ok_or_else(|| Error::NotFound(NOT_FOUND.to_string()))?;
        if survey.created_by != owner_id {
            return Err(Error::Forbidden(
                "You don't have permission to publish this survey.".to_string(),
            ));
        }
        let published = self.store.publish_survey(survey.id).await?;
        tracing::info!(survey_id, owner_id, "survey published");
        Ok(published)
    }

    pub async fn add_question(
        &self,
        owner_id: i64,
        survey_id: i64,
        question: CreateQuestion,
    ) -> Result<Question> {
        let survey = self
            .store
            .get_survey(survey_id)
            .await?
            .filter(|s| s.created_by == owner_id && !s.is_published)
            .ok_or_else(|| Error::NotFound(NOT_FOUND_OR_PUBLISHED.to_string()))?;
        let question = check_question(question)?;
        self.store.add_question(survey.id, question).await
    }

    pub async fn update_question(
        &self,
        owner_id: i64,
        survey_id: i64,
        question_id: i64,
        question: CreateQuestion,
    ) -> Result<Question> {
        let survey = self.load(survey_id).await?;
        self.store
            .get_question(question_id)
            .await?
            .filter(|q| q.survey_id == survey.id)
            .ok_or_else(|| Error::NotFound("Question not found.".to_string()))?;

        if survey.created_by != owner_id {
            return Err(Error::Forbidden(
                "You are not allowed to edit this question.".to_string(),
            ));
        }
        if survey.is_published {
            return Err(Error::Forbidden(
                "You are not allowed to edit a published survey.".to_string(),
            ));
        }

        let question = check_question(question)?;
        self.store.update_question(question_id, question).await
    }

    async fn load(&self, survey_id: i64) -> Result<Survey> {
        self.store
            .get_survey(survey_id)
            .await?
            .ok_or_else(|| Error::NotFound(NOT_FOUND.to_string()))
    }
}

/// Field rules plus the cross-field rules for objective questions.
fn check_question(q: CreateQuestion) -> Result<NewQuestion> {
    q.validate()?;

    if q.question_type == QuestionType::Objective {
        if let Some(options) = &q.options {
            if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
                return Err(Error::BadRequest(format!(
                    "Objective questions need between {} and {} options.",
                    MIN_OPTIONS, MAX_OPTIONS
                )));
            }
        }
        if let Some(correct) = &q.correct_answer {
            let listed = q
                .options
                .as_deref()
                .map_or(false, |opts| opts.iter().any(|o| o == correct));
            if !listed {
                return Err(Error::BadRequest(
                    "The correct answer must be one of the options.".to_string(),
                ));
            }
        }
    }

    Ok(q.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::catalog::MAX_QUESTIONS;
    use crate::database::memory::MemoryCatalogStore;
    use crate::models::user::{NewUser, User};

    async fn setup() -> (SurveyService, Arc<MemoryCatalogStore>, User, User) {
        let store = Arc::new(MemoryCatalogStore::new());
        let owner = store
            .create_user(NewUser {
                username: "owner".into(),
                email: "owner@example.com".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap();
        let stranger = store
            .create_user(NewUser {
                username: "stranger".into(),
                email: "stranger@example.com".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap();
        (SurveyService::new(store.clone()), store, owner, stranger)
    }

    fn objective(options: &[&str], correct: Option<&str>) -> CreateQuestion {
        CreateQuestion {
            question: "Pick".into(),
            question_type: QuestionType::Objective,
            score_of_objective: Some(2),
            options: Some(options.iter().map(|o| o.to_string()).collect()),
            correct_answer: correct.map(str::to_string),
        }
    }

    fn open_question() -> CreateQuestion {
        CreateQuestion {
            question: "Thoughts?".into(),
            question_type: QuestionType::Other,
            score_of_objective: None,
            options: None,
            correct_answer: None,
        }
    }

    fn payload(title: &str) -> CreateSurveyPayload {
        CreateSurveyPayload {
            title: title.into(),
            questions: vec![objective(&["x", "y"], Some("y")), open_question()],
        }
    }

    #[tokio::test]
    async fn create_numbers_questions_in_order() {
        let (svc, store, owner, _) = setup().await;
        let survey = svc.create_survey(owner.id, payload("Food")).await.unwrap();
        assert!(!survey.is_published);
        let numbers: Vec<i32> = store
            .list_questions(survey.id)
            .await
            .unwrap()
            .iter()
            .map(|q| q.question_number)
            .collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[tokio::test]
    async fn create_rejects_bad_objective_questions() {
        let (svc, _, owner, _) = setup().await;

        let mut p = payload("One option");
        p.questions = vec![objective(&["only"], None)];
        assert!(matches!(svc.create_survey(owner.id, p).await, Err(Error::BadRequest(_))));

        let mut p = payload("Unlisted");
        p.questions = vec![objective(&["a", "b"], Some("c"))];
        assert!(matches!(svc.create_survey(owner.id, p).await, Err(Error::BadRequest(_))));

        let mut p = payload("Negative");
        let mut q = objective(&["a", "b"], Some("a"));
        q.score_of_objective = Some(-1);
        p.questions = vec![q];
        assert!(matches!(svc.create_survey(owner.id, p).await, Err(Error::Validation(_))));

        let mut p = payload("Empty");
        p.questions.clear();
        assert!(matches!(svc.create_survey(owner.id, p).await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn published_detail_hides_unpublished_surveys() {
        let (svc, _, owner, _) = setup().await;
        let survey = svc.create_survey(owner.id, payload("Hidden")).await.unwrap();

        assert!(matches!(svc.published_detail(survey.id).await, Err(Error::NotFound(_))));
        assert!(svc.list_published().await.unwrap().is_empty());

        svc.publish(owner.id, survey.id).await.unwrap();
        let detail = svc.published_detail(survey.id).await.unwrap();
        assert_eq!(detail.created_by.username, "owner");
        assert_eq!(detail.questions.len(), 2);
        assert_eq!(svc.list_published().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn publish_checks_owner_and_state() {
        let (svc, _, owner, stranger) = setup().await;
        let survey = svc.create_survey(owner.id, payload("Poll")).await.unwrap();

        assert!(matches!(svc.publish(stranger.id, survey.id).await, Err(Error::Forbidden(_))));
        assert!(svc.publish(owner.id, survey.id).await.unwrap().is_published);
        assert!(matches!(svc.publish(owner.id, survey.id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn unpublished_views_are_owner_only() {
        let (svc, _, owner, stranger) = setup().await;
        let survey = svc.create_survey(owner.id, payload("Draft")).await.unwrap();

        assert_eq!(svc.list_unpublished(owner.id).await.unwrap().len(), 1);
        assert!(svc.list_unpublished(stranger.id).await.unwrap().is_empty());

        let detail = svc.unpublished_detail(owner.id, survey.id).await.unwrap();
        assert_eq!(detail.questions[0].correct_answer.as_deref(), Some("y"));
        assert!(matches!(
            svc.unpublished_detail(stranger.id, survey.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn title_edits_require_owner_and_draft() {
        let (svc, _, owner, stranger) = setup().await;
        let survey = svc.create_survey(owner.id, payload("Old")).await.unwrap();

        assert!(matches!(
            svc.update_title(stranger.id, survey.id, "New").await,
            Err(Error::Forbidden(_))
        ));
        assert_eq!(svc.update_title(owner.id, survey.id, "New").await.unwrap().title, "New");

        svc.publish(owner.id, survey.id).await.unwrap();
        assert!(matches!(
            svc.update_title(owner.id, survey.id, "Newer").await,
            Err(Error::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn blank_titles_are_rejected_after_trimming() {
        let (svc, store, owner, _) = setup().await;

        assert!(matches!(
            svc.create_survey(owner.id, payload("   ")).await,
            Err(Error::Validation(_))
        ));
        assert!(store.list_surveys(SurveyFilter::default()).await.unwrap().is_empty());

        let survey = svc.create_survey(owner.id, payload("  Padded  ")).await.unwrap();
        assert_eq!(survey.title, "Padded");
        assert!(matches!(
            svc.update_title(owner.id, survey.id, " \t ").await,
            Err(Error::Validation(_))
        ));
        assert_eq!(svc.load(survey.id).await.unwrap().title, "Padded");
    }

    #[tokio::test]
    async fn add_question_stops_at_the_question_cap() {
        let (svc, store, owner, _) = setup().await;
        let survey = svc.create_survey(owner.id, payload("Full")).await.unwrap();
        for _ in 2..MAX_QUESTIONS {
            svc.add_question(owner.id, survey.id, open_question()).await.unwrap();
        }
        assert_eq!(store.list_questions(survey.id).await.unwrap().len(), MAX_QUESTIONS);

        match svc.add_question(owner.id, survey.id, open_question()).await {
            Err(Error::BadRequest(msg)) => {
                assert_eq!(msg, "A survey can have at most 20 questions.")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn add_question_appends_to_own_draft_only() {
        let (svc, _, owner, stranger) = setup().await;
        let survey = svc.create_survey(owner.id, payload("Grow")).await.unwrap();

        let added = svc.add_question(owner.id, survey.id, open_question()).await.unwrap();
        assert_eq!(added.question_number, 3);

        match svc.add_question(stranger.id, survey.id, open_question()).await {
            Err(Error::NotFound(msg)) => assert_eq!(msg, NOT_FOUND_OR_PUBLISHED),
            other => panic!("unexpected: {other:?}"),
        }

        svc.publish(owner.id, survey.id).await.unwrap();
        assert!(matches!(
            svc.add_question(owner.id, survey.id, open_question()).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_question_keeps_its_number() {
        let (svc, store, owner, stranger) = setup().await;
        let survey = svc.create_survey(owner.id, payload("Edit")).await.unwrap();
        let first = store.list_questions(survey.id).await.unwrap().remove(0);

        let updated = svc
            .update_question(owner.id, survey.id, first.id, objective(&["p", "q", "r"], Some("r")))
            .await
            .unwrap();
        assert_eq!(updated.question_number, 1);
        assert_eq!(updated.correct_answer.as_deref(), Some("r"));

        assert!(matches!(
            svc.update_question(stranger.id, survey.id, first.id, open_question()).await,
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            svc.update_question(owner.id, survey.id, 9_999, open_question()).await,
            Err(Error::NotFound(_))
        ));
    }
}
