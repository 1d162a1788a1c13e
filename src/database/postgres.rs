use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use super::catalog::{
    AuthoringStore, CatalogStore, SubmissionTx, SurveyFilter, too_many_questions, DUPLICATE_EMAIL,
    DUPLICATE_TITLE, MAX_QUESTIONS,
};
use crate::error::{is_unique_violation, Error, Result};
use crate::models::question::{NewQuestion, Question};
use crate::models::score::Score;
use crate::models::survey::{Survey, SurveySummary};
use crate::models::survey_response::NewSurveyResponse;
use crate::models::user::{NewUser, User};

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at";
const SURVEY_COLUMNS: &str = "id, title, created_by, is_published, created_time";
const QUESTION_COLUMNS: &str = "id, survey_id, question_number, question, question_type, \
                                score_of_objective, options, correct_answer";
const SCORE_COLUMNS: &str = "id, user_id, survey_id, total_score";

#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_unique(err: sqlx::Error, message: &str) -> Error {
    if is_unique_violation(&err) {
        Error::BadRequest(message.to_string())
    } else {
        Error::from(err)
    }
}

async fn insert_question(
    tx: &mut Transaction<'static, Postgres>,
    survey_id: i64,
    number: i32,
    q: NewQuestion,
) -> Result<Question> {
    let question = sqlx::query_as::<_, Question>(&format!(
        r#"
        INSERT INTO questions (
            survey_id, question_number, question, question_type,
            score_of_objective, options, correct_answer
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {QUESTION_COLUMNS}
        "#
    ))
    .bind(survey_id)
    .bind(number)
    .bind(q.question)
    .bind(q.question_type)
    .bind(q.score_of_objective)
    .bind(q.options)
    .bind(q.correct_answer)
    .fetch_one(&mut **tx)
    .await?;
    Ok(question)
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_survey(&self, id: i64) -> Result<Option<Survey>> {
        let survey = sqlx::query_as::<_, Survey>(&format!(
            "SELECT {SURVEY_COLUMNS} FROM surveys WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(survey)
    }

    async fn get_question(&self, id: i64) -> Result<Option<Question>> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    async fn responses_exist(&self, user_id: i64, survey_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM survey_responses WHERE user_id = $1 AND survey_id = $2)"#,
        )
        .bind(user_id)
        .bind(survey_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn get_score(&self, user_id: i64, survey_id: i64) -> Result<Option<Score>> {
        let score = sqlx::query_as::<_, Score>(&format!(
            "SELECT {SCORE_COLUMNS} FROM scores WHERE user_id = $1 AND survey_id = $2"
        ))
        .bind(user_id)
        .bind(survey_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(score)
    }

    async fn begin_submission(
        &self,
        user_id: i64,
        survey_id: i64,
    ) -> Result<Box<dyn SubmissionTx>> {
        let mut tx = self.pool.begin().await?;
        // Held until commit/rollback; serializes racing submissions for the pair.
        sqlx::query(
            r#"SELECT pg_advisory_xact_lock(hashtextextended($1::text || ':' || $2::text, 0))"#,
        )
        .bind(user_id)
        .bind(survey_id)
        .execute(&mut *tx)
        .await?;
        Ok(Box::new(PgSubmissionTx { tx }))
    }
}

pub struct PgSubmissionTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SubmissionTx for PgSubmissionTx {
    async fn responses_exist(&mut self, user_id: i64, survey_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM survey_responses WHERE user_id = $1 AND survey_id = $2)"#,
        )
        .bind(user_id)
        .bind(survey_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn get_score(&mut self, user_id: i64, survey_id: i64) -> Result<Option<Score>> {
        let score = sqlx::query_as::<_, Score>(&format!(
            "SELECT {SCORE_COLUMNS} FROM scores WHERE user_id = $1 AND survey_id = $2"
        ))
        .bind(user_id)
        .bind(survey_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(score)
    }

    async fn bulk_insert(&mut self, responses: Vec<NewSurveyResponse>) -> Result<u64> {
        if responses.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO survey_responses (user_id, survey_id, question_id, answer) ",
        );
        builder.push_values(responses, |mut row, r| {
            row.push_bind(r.user_id)
                .push_bind(r.survey_id)
                .push_bind(r.question_id)
                .push_bind(r.answer);
        });

        let result = builder
            .build()
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Error::AlreadySubmitted
                } else {
                    Error::from(e)
                }
            })?;
        Ok(result.rows_affected())
    }

    async fn upsert_score(&mut self, user_id: i64, survey_id: i64, total: i64) -> Result<Score> {
        let score = sqlx::query_as::<_, Score>(&format!(
            r#"
            INSERT INTO scores (user_id, survey_id, total_score)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, survey_id) DO UPDATE SET total_score = EXCLUDED.total_score
            RETURNING {SCORE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(survey_id)
        .bind(total)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(score)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl AuthoringStore for PgCatalogStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, DUPLICATE_EMAIL))?;
        Ok(created)
    }

    async fn create_survey(
        &self,
        owner_id: i64,
        title: &str,
        questions: Vec<NewQuestion>,
    ) -> Result<Survey> {
        let mut tx = self.pool.begin().await?;

        let survey = sqlx::query_as::<_, Survey>(&format!(
            r#"
            INSERT INTO surveys (title, created_by)
            VALUES ($1, $2)
            RETURNING {SURVEY_COLUMNS}
            "#
        ))
        .bind(title)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique(e, DUPLICATE_TITLE))?;

        for (idx, q) in questions.into_iter().enumerate() {
            insert_question(&mut tx, survey.id, idx as i32 + 1, q).await?;
        }

        tx.commit().await?;
        Ok(survey)
    }

    async fn list_surveys(&self, filter: SurveyFilter) -> Result<Vec<SurveySummary>> {
        let rows = sqlx::query_as::<_, SurveySummary>(
            r#"
            SELECT s.id, s.title, s.created_by, u.username AS creator_username,
                   s.is_published, s.created_time
            FROM surveys s
            JOIN users u ON u.id = s.created_by
            WHERE ($1::bigint IS NULL OR s.created_by = $1)
              AND ($2::boolean IS NULL OR s.is_published = $2)
            ORDER BY s.created_time DESC, s.id DESC
            "#,
        )
        .bind(filter.created_by)
        .bind(filter.is_published)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_questions(&self, survey_id: i64) -> Result<Vec<Question>> {
        let rows = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE survey_id = $1 ORDER BY question_number"
        ))
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_survey_title(&self, survey_id: i64, title: &str) -> Result<Survey> {
        let survey = sqlx::query_as::<_, Survey>(&format!(
            "UPDATE surveys SET title = $2 WHERE id = $1 RETURNING {SURVEY_COLUMNS}"
        ))
        .bind(survey_id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique(e, DUPLICATE_TITLE))?;
        survey.ok_or_else(|| Error::NotFound("Survey not found.".to_string()))
    }

    async fn publish_survey(&self, survey_id: i64) -> Result<Survey> {
        let survey = sqlx::query_as::<_, Survey>(&format!(
            "UPDATE surveys SET is_published = TRUE WHERE id = $1 RETURNING {SURVEY_COLUMNS}"
        ))
        .bind(survey_id)
        .fetch_optional(&self.pool)
        .await?;
        survey.ok_or_else(|| Error::NotFound("Survey not found.".to_string()))
    }

    async fn add_question(&self, survey_id: i64, question: NewQuestion) -> Result<Question> {
        let mut tx = self.pool.begin().await?;

        // Row lock keeps concurrent appends from picking the same number.
        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM surveys WHERE id = $1 FOR UPDATE")
                .bind(survey_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(Error::NotFound("Survey not found.".to_string()));
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE survey_id = $1")
            .bind(survey_id)
            .fetch_one(&mut *tx)
            .await?;
        if count >= MAX_QUESTIONS as i64 {
            return Err(too_many_questions());
        }

        let next: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(question_number), 0) + 1 FROM questions WHERE survey_id = $1",
        )
        .bind(survey_id)
        .fetch_one(&mut *tx)
        .await?;

        let created = insert_question(&mut tx, survey_id, next, question).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn update_question(&self, question_id: i64, question: NewQuestion) -> Result<Question> {
        let updated = sqlx::query_as::<_, Question>(&format!(
            r#"
            UPDATE questions
            SET question = $2, question_type = $3, score_of_objective = $4,
                options = $5, correct_answer = $6
            WHERE id = $1
            RETURNING {QUESTION_COLUMNS}
            "#
        ))
        .bind(question_id)
        .bind(question.question)
        .bind(question.question_type)
        .bind(question.score_of_objective)
        .bind(question.options)
        .bind(question.correct_answer)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or_else(|| Error::NotFound("Question not found.".to_string()))
    }
}
