use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A completed practice session, one row per run-through.
/// Live sessions are held in memory only; rows appear at save time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub score: i32,
    pub question_count: i32,
    pub completed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// One answered (or skipped) question within a saved session.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PracticeAnswerRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub position: i32,
    pub question: String,
    pub answer: Option<String>,
    pub feedback: Option<String>,
    pub confidence: i16,
}
