use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudyPlan {
    pub id: Uuid,
    pub document_id: Uuid,
    pub plan_md: String,
    pub created_at: DateTime<Utc>,
}
