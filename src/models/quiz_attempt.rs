use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const MAX_SCORE: i32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub answers_json: String,
    pub score: i32,
    pub max_score: i32,
    pub created_at: DateTime<Utc>,
}

/// One row of a document's attempt history.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AttemptRow {
    pub attempt_id: Uuid,
    pub attempt_at: DateTime<Utc>,
    pub score: i32,
    pub max_score: i32,
    pub quiz_type: String,
    pub quiz_id: Uuid,
}
