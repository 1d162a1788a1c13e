use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::question::{NewQuestion, Question, QuestionType};

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQuestion {
    #[validate(length(min = 1, message = "Question text must not be empty"))]
    pub question: String,
    #[serde(default)]
    pub question_type: QuestionType,
    #[validate(range(min = 0, message = "Points must not be negative"))]
    pub score_of_objective: Option<i32>,
    pub options: Option<Vec<String>>,
    #[validate(length(max = 255))]
    pub correct_answer: Option<String>,
}

impl From<CreateQuestion> for NewQuestion {
    fn from(q: CreateQuestion) -> Self {
        NewQuestion {
            question: q.question,
            question_type: q.question_type,
            score_of_objective: q.score_of_objective,
            options: q.options,
            correct_answer: q.correct_answer,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSurveyPayload {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(
        min = 1,
        max = 20,
        message = "A survey needs between 1 and 20 questions"
    ))]
    pub questions: Vec<CreateQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateTitlePayload {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorView {
    pub username: String,
}

/// A question as shown to respondents; the correct answer stays hidden.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_number: i32,
    pub question: String,
    pub question_type: QuestionType,
    pub score_of_objective: Option<i32>,
    pub options: Option<Vec<String>>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            question_number: q.question_number,
            question: q.question,
            question_type: q.question_type,
            score_of_objective: q.score_of_objective,
            options: q.options,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedSurveyDetail {
    pub id: i64,
    pub title: String,
    pub created_time: DateTime<Utc>,
    pub created_by: CreatorView,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnpublishedSurveyDetail {
    pub id: i64,
    pub title: String,
    pub questions: Vec<Question>,
}
