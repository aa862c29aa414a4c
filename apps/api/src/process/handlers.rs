use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::process::{InterviewFollowupRow, InterviewProcessRow, InterviewStageRow};
use crate::practice::handlers::UserIdQuery;
use crate::state::AppState;

/// The allowed lifecycle states of a tracked process.
pub const PROCESS_STATUSES: [&str; 7] = [
    "applied",
    "screening",
    "interviewing",
    "offer",
    "accepted",
    "rejected",
    "withdrawn",
];

fn validate_status(status: &str) -> Result<(), AppError> {
    if PROCESS_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "status must be one of: {}",
            PROCESS_STATUSES.join(", ")
        )))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProcessRequest {
    pub user_id: Uuid,
    pub company_name: String,
    pub role_title: String,
    pub status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDetailResponse {
    pub process: InterviewProcessRow,
    pub stages: Vec<InterviewStageRow>,
    pub followups: Vec<InterviewFollowupRow>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRequest {
    pub title: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub outcome: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowupRequest {
    pub description: String,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
}

/// GET /api/interview/processes?userId=
pub async fn handle_list_processes(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<InterviewProcessRow>>, AppError> {
    let processes = sqlx::query_as::<_, InterviewProcessRow>(
        "SELECT * FROM interview_processes WHERE user_id = $1 ORDER BY updated_at DESC",
    )
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(processes))
}

/// POST /api/interview/processes
pub async fn handle_create_process(
    State(state): State<AppState>,
    Json(req): Json<CreateProcessRequest>,
) -> Result<Json<InterviewProcessRow>, AppError> {
    if req.company_name.trim().is_empty() || req.role_title.trim().is_empty() {
        return Err(AppError::Validation(
            "companyName and roleTitle must not be empty".to_string(),
        ));
    }
    let status = req.status.unwrap_or_else(|| "applied".to_string());
    validate_status(&status)?;

    let process = sqlx::query_as::<_, InterviewProcessRow>(
        r#"
        INSERT INTO interview_processes (id, user_id, company_name, role_title, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.user_id)
    .bind(req.company_name.trim())
    .bind(req.role_title.trim())
    .bind(&status)
    .fetch_one(&state.db)
    .await?;

    info!(
        "Created interview process {} ({} at {})",
        process.id, process.role_title, process.company_name
    );
    Ok(Json(process))
}

/// GET /api/interview/processes/:id
pub async fn handle_get_process(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProcessDetailResponse>, AppError> {
    let process = fetch_process(&state, id).await?;

    let stages = sqlx::query_as::<_, InterviewStageRow>(
        "SELECT * FROM interview_stages WHERE process_id = $1 ORDER BY position",
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;

    let followups = sqlx::query_as::<_, InterviewFollowupRow>(
        "SELECT * FROM interview_followups WHERE process_id = $1 ORDER BY due_date NULLS LAST, created_at",
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ProcessDetailResponse {
        process,
        stages,
        followups,
    }))
}

/// PUT /api/interview/processes/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<InterviewProcessRow>, AppError> {
    validate_status(&req.status)?;

    let process = sqlx::query_as::<_, InterviewProcessRow>(
        "UPDATE interview_processes SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(&req.status)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Process {id} not found")))?;

    Ok(Json(process))
}

/// DELETE /api/interview/processes/:id
pub async fn handle_delete_process(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM interview_processes WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Process {id} not found")));
    }
    info!("Deleted interview process {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/interview/processes/:id/stages
pub async fn handle_add_stage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StageRequest>,
) -> Result<Json<InterviewStageRow>, AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }
    fetch_process(&state, id).await?;

    // Stages append in interview order
    let position: i32 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM interview_stages WHERE process_id = $1",
    )
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    let stage = sqlx::query_as::<_, InterviewStageRow>(
        r#"
        INSERT INTO interview_stages
            (id, process_id, title, scheduled_at, location, notes, outcome, position)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(id)
    .bind(req.title.trim())
    .bind(req.scheduled_at)
    .bind(&req.location)
    .bind(&req.notes)
    .bind(&req.outcome)
    .bind(position)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(stage))
}

/// PUT /api/interview/processes/:id/stages/:stage_id
pub async fn handle_update_stage(
    State(state): State<AppState>,
    Path((id, stage_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<StageRequest>,
) -> Result<Json<InterviewStageRow>, AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }

    let stage = sqlx::query_as::<_, InterviewStageRow>(
        r#"
        UPDATE interview_stages
        SET title = $1, scheduled_at = $2, location = $3, notes = $4, outcome = $5
        WHERE id = $6 AND process_id = $7
        RETURNING *
        "#,
    )
    .bind(req.title.trim())
    .bind(req.scheduled_at)
    .bind(&req.location)
    .bind(&req.notes)
    .bind(&req.outcome)
    .bind(stage_id)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Stage {stage_id} not found")))?;

    Ok(Json(stage))
}

/// DELETE /api/interview/processes/:id/stages/:stage_id
pub async fn handle_delete_stage(
    State(state): State<AppState>,
    Path((id, stage_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM interview_stages WHERE id = $1 AND process_id = $2")
        .bind(stage_id)
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Stage {stage_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/interview/processes/:id/followups
pub async fn handle_add_followup(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<FollowupRequest>,
) -> Result<Json<InterviewFollowupRow>, AppError> {
    if req.description.trim().is_empty() {
        return Err(AppError::Validation(
            "description must not be empty".to_string(),
        ));
    }
    fetch_process(&state, id).await?;

    let followup = sqlx::query_as::<_, InterviewFollowupRow>(
        r#"
        INSERT INTO interview_followups (id, process_id, description, due_date, completed)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(id)
    .bind(req.description.trim())
    .bind(req.due_date)
    .bind(req.completed)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(followup))
}

/// PUT /api/interview/processes/:id/followups/:followup_id
pub async fn handle_update_followup(
    State(state): State<AppState>,
    Path((id, followup_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<FollowupRequest>,
) -> Result<Json<InterviewFollowupRow>, AppError> {
    if req.description.trim().is_empty() {
        return Err(AppError::Validation(
            "description must not be empty".to_string(),
        ));
    }

    let followup = sqlx::query_as::<_, InterviewFollowupRow>(
        r#"
        UPDATE interview_followups
        SET description = $1, due_date = $2, completed = $3
        WHERE id = $4 AND process_id = $5
        RETURNING *
        "#,
    )
    .bind(req.description.trim())
    .bind(req.due_date)
    .bind(req.completed)
    .bind(followup_id)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Followup {followup_id} not found")))?;

    Ok(Json(followup))
}

/// DELETE /api/interview/processes/:id/followups/:followup_id
pub async fn handle_delete_followup(
    State(state): State<AppState>,
    Path((id, followup_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM interview_followups WHERE id = $1 AND process_id = $2")
        .bind(followup_id)
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Followup {followup_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_process(state: &AppState, id: Uuid) -> Result<InterviewProcessRow, AppError> {
    sqlx::query_as::<_, InterviewProcessRow>("SELECT * FROM interview_processes WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Process {id} not found")))
}
