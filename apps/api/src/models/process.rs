use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An interview process being tracked for one role at one company.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InterviewProcessRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub role_title: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single round within a process (phone screen, onsite, etc.).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InterviewStageRow {
    pub id: Uuid,
    pub process_id: Uuid,
    pub title: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub outcome: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// A followup task attached to a process (thank-you note, status ping, etc.).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InterviewFollowupRow {
    pub id: Uuid,
    pub process_id: Uuid,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}
