use std::sync::Arc;

use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::llm_client::LlmClient;
use crate::practice::analysis::AnswerAnalyzer;
use crate::practice::runtime::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Redis client backing the practice history cache.
    pub redis: RedisClient,
    pub llm: LlmClient,
    /// Pluggable answer analyzer. Default: LlmAnswerAnalyzer over the Anthropic API.
    pub analyzer: Arc<dyn AnswerAnalyzer>,
    /// Live practice sessions and their countdown tasks.
    pub sessions: SessionStore,
}
