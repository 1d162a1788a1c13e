use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Score {
    pub id: i64,
    pub user_id: i64,
    pub survey_id: i64,
    pub total_score: i64,
}
