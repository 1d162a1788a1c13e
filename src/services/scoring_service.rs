use crate::services::response_validator::ValidatedBatch;

pub struct ScoringService;

impl ScoringService {
    /// Total points of a validated batch. Only objective questions answered
    /// with exactly their correct answer score; everything else counts zero.
    pub fn score(batch: &ValidatedBatch) -> i64 {
        batch
            .answers
            .iter()
            .map(|a| a.question.points_for(&a.answer))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{Question, QuestionType};
    use crate::models::survey::Survey;
    use crate::models::user::User;
    use crate::services::response_validator::ValidatedAnswer;
    use chrono::Utc;

    fn objective(id: i64, points: Option<i32>, correct: Option<&str>) -> Question {
        Question {
            id,
            survey_id: 1,
            question_number: id as i32,
            question: format!("q{id}"),
            question_type: QuestionType::Objective,
            score_of_objective: points,
            options: Some(vec!["a".into(), "b".into(), "c".into(), "".into()]),
            correct_answer: correct.map(str::to_string),
        }
    }

    fn batch(answers: Vec<(Question, &str)>) -> ValidatedBatch {
        ValidatedBatch {
            user: User {
                id: 7,
                username: "u".into(),
                email: "u@example.com".into(),
                password_hash: String::new(),
                created_at: Utc::now(),
            },
            survey: Survey {
                id: 1,
                title: "s".into(),
                created_by: 7,
                is_published: true,
                created_time: Utc::now(),
            },
            answers: answers
                .into_iter()
                .map(|(question, answer)| ValidatedAnswer {
                    question,
                    answer: answer.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn correct_objective_answers_earn_full_points() {
        let b = batch(vec![
            (objective(1, Some(5), Some("b")), "b"),
            (objective(2, Some(3), Some("a")), "a"),
        ]);
        assert_eq!(ScoringService::score(&b), 8);
    }

    #[test]
    fn wrong_or_empty_answers_earn_nothing() {
        let b = batch(vec![
            (objective(1, Some(5), Some("b")), "a"),
            (objective(2, Some(5), Some("b")), ""),
        ]);
        assert_eq!(ScoringService::score(&b), 0);
    }

    #[test]
    fn missing_points_or_correct_answer_count_as_zero() {
        let b = batch(vec![
            (objective(1, None, Some("b")), "b"),
            (objective(2, Some(4), None), "b"),
        ]);
        assert_eq!(ScoringService::score(&b), 0);
    }

    #[test]
    fn other_questions_are_ungraded() {
        let mut free = objective(1, Some(10), Some("b"));
        free.question_type = QuestionType::Other;
        let b = batch(vec![(free, "b")]);
        assert_eq!(ScoringService::score(&b), 0);
    }

    #[test]
    fn scoring_is_repeatable() {
        let b = batch(vec![
            (objective(1, Some(5), Some("b")), "b"),
            (objective(2, Some(2), Some("c")), "a"),
        ]);
        assert_eq!(ScoringService::score(&b), ScoringService::score(&b));
        assert_eq!(ScoringService::score(&b), 5);
    }
}
