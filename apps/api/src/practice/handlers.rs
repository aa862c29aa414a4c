use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::practice::{PracticeAnswerRow, PracticeSessionRow};
use crate::practice::analysis::{AnalyzeRequest, AnswerAnalysis};
use crate::practice::history::{self, CompletedEntry, CompletedSession, MAX_PERSISTED_SCORE};
use crate::practice::machine::{Action, Phase, QuestionRecord};
use crate::practice::questions::{self, Question, QuestionSet};
use crate::practice::runtime::{SessionSnapshot, MAX_SESSION_QUESTIONS};
use crate::practice::scoring::{MAX_CONFIDENCE, MIN_CONFIDENCE};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsRequest {
    pub job_title: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub user_id: Uuid,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub questions: Vec<Question>,
}

/// The actions a client may send. Driver-internal actions (ticks, analysis
/// arrivals) have no wire form, so they cannot be forged.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientAction {
    Start,
    SaveDraft { text: String },
    SubmitAnswer { text: String },
    Skip,
    ToggleHint,
    RateFeedback { helpful: bool },
    Advance,
}

impl From<ClientAction> for Action {
    fn from(action: ClientAction) -> Self {
        match action {
            ClientAction::Start => Action::Start,
            ClientAction::SaveDraft { text } => Action::SaveDraft { text },
            ClientAction::SubmitAnswer { text } => Action::SubmitAnswer { text },
            ClientAction::Skip => Action::Skip,
            ClientAction::ToggleHint => Action::ToggleHint,
            ClientAction::RateFeedback { helpful } => Action::RateFeedback { helpful },
            ClientAction::Advance => Action::Advance,
        }
    }
}

/// What the client renders: the current question in full, session-level
/// counters, and the summary payload once the session is over.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: Uuid,
    pub phase: Phase,
    pub current_index: usize,
    pub question_count: usize,
    pub time_remaining: u16,
    pub score: u32,
    pub hint_visible: bool,
    pub analysis_pending: bool,
    pub question: Question,
    pub answer: Option<String>,
    pub feedback: Option<String>,
    pub analysis: Option<AnswerAnalysis>,
    pub confidence: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryView>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub total_score: u32,
    pub entries: Vec<SummaryEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryEntry {
    pub question: String,
    pub answer: Option<String>,
    pub feedback: Option<String>,
    pub confidence: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSessionResponse {
    pub session_id: Uuid,
    pub score: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePracticeRequest {
    pub user_id: Uuid,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub score: u32,
    pub entries: Vec<SavePracticeEntry>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePracticeEntry {
    pub question: String,
    pub answer: Option<String>,
    pub feedback: Option<String>,
    pub confidence: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeDetailResponse {
    pub session: PracticeSessionRow,
    pub answers: Vec<PracticeAnswerRow>,
}

fn view_of(snapshot: &SessionSnapshot) -> SessionView {
    let state = &snapshot.state;
    let record = state.current_record();

    let summary = (state.phase() == Phase::Summary).then(|| SummaryView {
        total_score: state.score(),
        entries: state.records().iter().map(summary_entry).collect(),
    });

    SessionView {
        session_id: snapshot.id,
        phase: state.phase(),
        current_index: state.current_index(),
        question_count: state.question_count(),
        time_remaining: state.time_remaining(),
        score: state.score(),
        hint_visible: state.hint_visible(),
        analysis_pending: state.analysis_pending(),
        question: record.question.clone(),
        answer: record.answer.clone(),
        feedback: record.feedback.clone(),
        analysis: record.analysis.clone(),
        confidence: record.confidence,
        summary,
    }
}

fn summary_entry(record: &QuestionRecord) -> SummaryEntry {
    SummaryEntry {
        question: record.question.question.clone(),
        answer: record.answer.clone(),
        feedback: record.feedback.clone(),
        confidence: record.confidence,
    }
}

/// GET /api/interview/questions
pub async fn handle_question_bank() -> Json<QuestionSet> {
    Json(questions::question_bank())
}

/// POST /api/interview/generate-questions
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    Json(req): Json<GenerateQuestionsRequest>,
) -> Result<Json<QuestionSet>, AppError> {
    if req.job_title.trim().is_empty() {
        return Err(AppError::Validation("jobTitle must not be empty".to_string()));
    }
    let set = questions::generate_questions(&req.job_title, &req.skills, &state.llm).await?;
    Ok(Json(set))
}

/// POST /api/interview/analyze-answer
pub async fn handle_analyze_answer(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnswerAnalysis>, AppError> {
    if req.question.trim().is_empty() {
        return Err(AppError::Validation("question must not be empty".to_string()));
    }
    let analysis = state.analyzer.analyze(&req).await?;
    Ok(Json(analysis))
}

/// POST /api/interview/practice/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<SessionView>, AppError> {
    if req.questions.is_empty() {
        return Err(AppError::Validation(
            "a session needs at least one question".to_string(),
        ));
    }
    if req.questions.len() > MAX_SESSION_QUESTIONS {
        return Err(AppError::Validation(format!(
            "a session is capped at {MAX_SESSION_QUESTIONS} questions"
        )));
    }
    if req.questions.iter().any(|q| q.question.trim().is_empty()) {
        return Err(AppError::Validation(
            "questions must not be empty".to_string(),
        ));
    }

    let snapshot = state
        .sessions
        .create(req.user_id, req.job_title, req.company_name, req.questions)
        .await;
    Ok(Json(view_of(&snapshot)))
}

/// GET /api/interview/practice/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let snapshot = state.sessions.snapshot(id).await?;
    Ok(Json(view_of(&snapshot)))
}

/// POST /api/interview/practice/sessions/:id/actions
pub async fn handle_session_action(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(action): Json<ClientAction>,
) -> Result<Json<SessionView>, AppError> {
    let snapshot = state.sessions.apply(id, action.into()).await?;
    Ok(Json(view_of(&snapshot)))
}

/// POST /api/interview/practice/sessions/:id/save
pub async fn handle_save_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SaveSessionResponse>, AppError> {
    let snapshot = state.sessions.take_completed(id).await?;
    let completed = CompletedSession::from_snapshot(&snapshot, Utc::now());

    match history::save_session(&state.db, &state.redis, &completed).await {
        Ok(saved_id) => Ok(Json(SaveSessionResponse {
            session_id: saved_id,
            score: completed.score,
        })),
        Err(e) => {
            // A failed save puts the session back so the summary stays open
            // for a retry.
            state.sessions.restore(snapshot).await;
            Err(AppError::Internal(e))
        }
    }
}

/// DELETE /api/interview/practice/sessions/:id
pub async fn handle_discard_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.remove(id).await {
        return Err(AppError::NotFound(format!(
            "Practice session {id} not found"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn validate_save_practice(req: &SavePracticeRequest) -> Result<(), AppError> {
    if req.entries.is_empty() {
        return Err(AppError::Validation(
            "a completed session needs at least one entry".to_string(),
        ));
    }
    if req.entries.len() > MAX_SESSION_QUESTIONS {
        return Err(AppError::Validation(format!(
            "a session is capped at {MAX_SESSION_QUESTIONS} questions"
        )));
    }
    if req.score > MAX_PERSISTED_SCORE {
        return Err(AppError::Validation(format!(
            "score must not exceed {MAX_PERSISTED_SCORE}"
        )));
    }
    for entry in &req.entries {
        if entry.question.trim().is_empty() {
            return Err(AppError::Validation(
                "entry questions must not be empty".to_string(),
            ));
        }
        if !(MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&entry.confidence) {
            return Err(AppError::Validation(format!(
                "confidence must be between {MIN_CONFIDENCE} and {MAX_CONFIDENCE}"
            )));
        }
    }
    Ok(())
}

/// POST /api/interview/practice
pub async fn handle_save_practice(
    State(state): State<AppState>,
    Json(req): Json<SavePracticeRequest>,
) -> Result<Json<SaveSessionResponse>, AppError> {
    validate_save_practice(&req)?;

    let completed = CompletedSession {
        user_id: req.user_id,
        job_title: req.job_title,
        company_name: req.company_name,
        score: req.score,
        entries: req
            .entries
            .into_iter()
            .map(|e| CompletedEntry {
                question: e.question,
                answer: e.answer,
                feedback: e.feedback,
                confidence: e.confidence,
            })
            .collect(),
        completed_at: req.completed_at.unwrap_or_else(Utc::now),
    };

    let saved_id = history::save_session(&state.db, &state.redis, &completed).await?;
    Ok(Json(SaveSessionResponse {
        session_id: saved_id,
        score: completed.score,
    }))
}

/// GET /api/interview/practice/history?userId=
pub async fn handle_practice_history(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<PracticeSessionRow>>, AppError> {
    let rows = history::list_history(&state.db, &state.redis, params.user_id).await?;
    Ok(Json(rows))
}

/// GET /api/interview/practice/history/:id
pub async fn handle_practice_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PracticeDetailResponse>, AppError> {
    let detail = history::fetch_session_detail(&state.db, id).await?;
    let (session, answers) = detail
        .ok_or_else(|| AppError::NotFound(format!("Practice session {id} not found")))?;
    Ok(Json(PracticeDetailResponse { session, answers }))
}
