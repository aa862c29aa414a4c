// Persistence for completed sessions, plus the redis-backed history reads.
// Live sessions never touch the database; rows exist only after a save.

use anyhow::Result;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::practice::{PracticeAnswerRow, PracticeSessionRow};
use crate::practice::runtime::SessionSnapshot;

const HISTORY_CACHE_TTL_SECS: u64 = 300;

/// Largest score the storage layer accepts. Scores land in an INTEGER
/// column, and any u32 above this would wrap negative in the cast below.
pub const MAX_PERSISTED_SCORE: u32 = i32::MAX as u32;

/// One line of a completed session: what was asked, what was answered,
/// what the feedback was, and where the confidence meter ended up.
#[derive(Debug, Clone)]
pub struct CompletedEntry {
    pub question: String,
    pub answer: Option<String>,
    pub feedback: Option<String>,
    pub confidence: u8,
}

/// A finished session ready to persist.
#[derive(Debug, Clone)]
pub struct CompletedSession {
    pub user_id: Uuid,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub score: u32,
    pub entries: Vec<CompletedEntry>,
    pub completed_at: DateTime<Utc>,
}

impl CompletedSession {
    /// Flattens a summary-phase session into its persistable form.
    pub fn from_snapshot(snapshot: &SessionSnapshot, completed_at: DateTime<Utc>) -> Self {
        Self {
            user_id: snapshot.user_id,
            job_title: snapshot.job_title.clone(),
            company_name: snapshot.company_name.clone(),
            score: snapshot.state.score(),
            entries: snapshot
                .state
                .records()
                .iter()
                .map(|record| CompletedEntry {
                    question: record.question.question.clone(),
                    answer: record.answer.clone(),
                    feedback: record.feedback.clone(),
                    confidence: record.confidence,
                })
                .collect(),
            completed_at,
        }
    }
}

pub fn history_cache_key(user_id: Uuid) -> String {
    format!("practice:history:{user_id}")
}

/// Persists a completed session atomically: the session row and its answer
/// rows land in one transaction. Invalidates the owner's history cache on
/// success; cache trouble is logged and tolerated.
///
/// Callers validate the score against [`MAX_PERSISTED_SCORE`].
pub async fn save_session(
    pool: &PgPool,
    redis: &redis::Client,
    session: &CompletedSession,
) -> Result<Uuid> {
    debug_assert!(
        session.score <= MAX_PERSISTED_SCORE,
        "score exceeds the stored range"
    );
    let session_id = Uuid::new_v4();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO practice_sessions
            (id, user_id, job_title, company_name, score, question_count, completed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(session_id)
    .bind(session.user_id)
    .bind(&session.job_title)
    .bind(&session.company_name)
    .bind(session.score as i32)
    .bind(session.entries.len() as i32)
    .bind(session.completed_at)
    .execute(&mut *tx)
    .await?;

    for (position, entry) in session.entries.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO practice_answers
                (id, session_id, position, question, answer, feedback, confidence)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(session_id)
        .bind(position as i32)
        .bind(&entry.question)
        .bind(&entry.answer)
        .bind(&entry.feedback)
        .bind(entry.confidence as i16)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(
        "Saved practice session {session_id} for user {} ({} answers, score {})",
        session.user_id,
        session.entries.len(),
        session.score
    );

    invalidate_history_cache(redis, session.user_id).await;

    Ok(session_id)
}

/// Lists a user's completed sessions, newest first, through a 5-minute cache.
pub async fn list_history(
    pool: &PgPool,
    redis: &redis::Client,
    user_id: Uuid,
) -> Result<Vec<PracticeSessionRow>> {
    let key = history_cache_key(user_id);

    if let Some(cached) = read_cached_history(redis, &key).await {
        return Ok(cached);
    }

    let rows = sqlx::query_as::<_, PracticeSessionRow>(
        "SELECT * FROM practice_sessions WHERE user_id = $1 ORDER BY completed_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    write_cached_history(redis, &key, &rows).await;

    Ok(rows)
}

/// One saved session with its answers in question order, or None if unknown.
pub async fn fetch_session_detail(
    pool: &PgPool,
    session_id: Uuid,
) -> Result<Option<(PracticeSessionRow, Vec<PracticeAnswerRow>)>> {
    let session = sqlx::query_as::<_, PracticeSessionRow>(
        "SELECT * FROM practice_sessions WHERE id = $1",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    let Some(session) = session else {
        return Ok(None);
    };

    let answers = sqlx::query_as::<_, PracticeAnswerRow>(
        "SELECT * FROM practice_answers WHERE session_id = $1 ORDER BY position",
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    Ok(Some((session, answers)))
}

async fn invalidate_history_cache(redis: &redis::Client, user_id: Uuid) {
    let key = history_cache_key(user_id);
    match redis.get_multiplexed_async_connection().await {
        Ok(mut conn) => {
            if let Err(e) = conn.del::<_, ()>(&key).await {
                warn!("Failed to invalidate history cache {key}: {e}");
            }
        }
        Err(e) => warn!("Redis unavailable for history cache invalidation: {e}"),
    }
}

async fn read_cached_history(redis: &redis::Client, key: &str) -> Option<Vec<PracticeSessionRow>> {
    let mut conn = redis.get_multiplexed_async_connection().await.ok()?;
    let cached: Option<String> = conn.get(key).await.ok()?;
    let payload = cached?;

    match serde_json::from_str(&payload) {
        Ok(rows) => {
            debug!("History cache hit for {key}");
            Some(rows)
        }
        Err(e) => {
            warn!("Discarding unreadable history cache {key}: {e}");
            None
        }
    }
}

async fn write_cached_history(redis: &redis::Client, key: &str, rows: &[PracticeSessionRow]) {
    let payload = match serde_json::to_string(rows) {
        Ok(p) => p,
        Err(e) => {
            warn!("Failed to serialize history for cache {key}: {e}");
            return;
        }
    };

    match redis.get_multiplexed_async_connection().await {
        Ok(mut conn) => {
            if let Err(e) = conn
                .set_ex::<_, _, ()>(key, payload, HISTORY_CACHE_TTL_SECS)
                .await
            {
                warn!("Failed to write history cache {key}: {e}");
            }
        }
        Err(e) => warn!("Redis unavailable for history cache write: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::practice::machine::{Action, SessionState};
    use crate::practice::questions::Question;

    fn summary_snapshot() -> SessionSnapshot {
        let questions = vec![
            Question {
                question: "First question".to_string(),
                description: None,
                suggested_answer: None,
            },
            Question {
                question: "Second question".to_string(),
                description: None,
                suggested_answer: None,
            },
        ];
        let mut state = SessionState::new(questions);

        // Answer the first, skip the second
        state.apply(Action::Start).unwrap();
        state
            .apply(Action::SubmitAnswer {
                text: "An answer".to_string(),
            })
            .unwrap();
        state.apply(Action::Advance).unwrap();
        state.apply(Action::Start).unwrap();
        state.apply(Action::Skip).unwrap();

        SessionSnapshot {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            job_title: Some("Backend Engineer".to_string()),
            company_name: None,
            state,
        }
    }

    #[test]
    fn test_cache_key_is_per_user() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_ne!(history_cache_key(a), history_cache_key(b));
        assert!(history_cache_key(a).starts_with("practice:history:"));
    }

    #[test]
    fn test_from_snapshot_keeps_question_order() {
        let snapshot = summary_snapshot();
        let completed = CompletedSession::from_snapshot(&snapshot, Utc::now());

        assert_eq!(completed.user_id, snapshot.user_id);
        assert_eq!(completed.job_title.as_deref(), Some("Backend Engineer"));
        assert_eq!(completed.entries.len(), 2);
        assert_eq!(completed.entries[0].question, "First question");
        assert_eq!(completed.entries[0].answer.as_deref(), Some("An answer"));
        assert_eq!(completed.entries[1].question, "Second question");
        assert!(completed.entries[1].answer.is_none());
        assert_eq!(completed.score, snapshot.state.score());
    }
}
