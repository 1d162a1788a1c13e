use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "question_kind", rename_all = "snake_case")]
pub enum QuestionType {
    Objective,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: i64,
    pub survey_id: i64,
    pub question_number: i32,
    pub question: String,
    pub question_type: QuestionType,
    pub score_of_objective: Option<i32>,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<String>,
}

impl Question {
    pub fn is_objective(&self) -> bool {
        self.question_type == QuestionType::Objective
    }

    pub fn has_option(&self, answer: &str) -> bool {
        self.options
            .as_deref()
            .map(|opts| opts.iter().any(|o| o == answer))
            .unwrap_or(false)
    }

    /// Points awarded for `answer`: the full value on an exact match with the
    /// correct answer, otherwise zero. Non-objective questions are ungraded.
    pub fn points_for(&self, answer: &str) -> i64 {
        if !self.is_objective() {
            return 0;
        }
        match (&self.correct_answer, self.score_of_objective) {
            (Some(correct), Some(points)) if correct == answer => i64::from(points.max(0)),
            _ => 0,
        }
    }
}

/// Question content as authored; the number is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewQuestion {
    pub question: String,
    pub question_type: QuestionType,
    pub score_of_objective: Option<i32>,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<String>,
}
