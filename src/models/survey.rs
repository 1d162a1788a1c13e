use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Survey {
    pub id: i64,
    pub title: String,
    pub created_by: i64,
    pub is_published: bool,
    pub created_time: DateTime<Utc>,
}

/// A survey row joined with its creator's username, used by list views.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SurveySummary {
    pub id: i64,
    pub title: String,
    pub created_by: i64,
    pub creator_username: String,
    pub is_published: bool,
    pub created_time: DateTime<Utc>,
}
