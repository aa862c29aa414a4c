pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::practice::handlers as practice;
use crate::process::handlers as process;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Question sourcing
        .route(
            "/api/interview/questions",
            get(practice::handle_question_bank),
        )
        .route(
            "/api/interview/generate-questions",
            post(practice::handle_generate_questions),
        )
        // One-off answer analysis
        .route(
            "/api/interview/analyze-answer",
            post(practice::handle_analyze_answer),
        )
        // Live practice sessions
        .route(
            "/api/interview/practice/sessions",
            post(practice::handle_create_session),
        )
        .route(
            "/api/interview/practice/sessions/:id",
            get(practice::handle_get_session).delete(practice::handle_discard_session),
        )
        .route(
            "/api/interview/practice/sessions/:id/actions",
            post(practice::handle_session_action),
        )
        .route(
            "/api/interview/practice/sessions/:id/save",
            post(practice::handle_save_session),
        )
        // Practice history
        .route(
            "/api/interview/practice",
            post(practice::handle_save_practice),
        )
        .route(
            "/api/interview/practice/history",
            get(practice::handle_practice_history),
        )
        .route(
            "/api/interview/practice/history/:id",
            get(practice::handle_practice_detail),
        )
        // Interview process tracking
        .route(
            "/api/interview/processes",
            get(process::handle_list_processes).post(process::handle_create_process),
        )
        .route(
            "/api/interview/processes/:id",
            get(process::handle_get_process).delete(process::handle_delete_process),
        )
        .route(
            "/api/interview/processes/:id/status",
            put(process::handle_update_status),
        )
        .route(
            "/api/interview/processes/:id/stages",
            post(process::handle_add_stage),
        )
        .route(
            "/api/interview/processes/:id/stages/:stage_id",
            put(process::handle_update_stage).delete(process::handle_delete_stage),
        )
        .route(
            "/api/interview/processes/:id/followups",
            post(process::handle_add_followup),
        )
        .route(
            "/api/interview/processes/:id/followups/:followup_id",
            put(process::handle_update_followup).delete(process::handle_delete_followup),
        )
        .with_state(state)
}
