//! In-memory registry of live practice sessions.
//!
//! The store is the only owner of mutable session state. Every mutation,
//! whether it comes from a handler, a countdown task, or an analysis task,
//! funnels through [`SessionStore::apply`]: lock, reduce, execute effects,
//! snapshot. Effect execution under the lock is abort/spawn only; nothing
//! ever awaits I/O while holding it.
//!
//! Countdown tasks tick once a second and re-enter with the epoch they were
//! started under, so a tick that raced a submit or skip dies in the reducer.
//! Tasks are aborted at every question exit and never outlive their session.

use std::collections::{hash_map::Entry, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::practice::analysis::{AnalyzeRequest, AnswerAnalyzer};
use crate::practice::machine::{
    Action, AnalysisOutcome, Effect, Phase, SessionState, TransitionError,
};
use crate::practice::questions::Question;

/// Cadence of the countdown task.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Sessions untouched this long are presumed abandoned and evicted.
pub const IDLE_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Upper bound on questions per session, enforced at creation.
pub const MAX_SESSION_QUESTIONS: usize = 50;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct ActiveSession {
    user_id: Uuid,
    job_title: Option<String>,
    company_name: Option<String>,
    machine: SessionState,
    timer: Option<JoinHandle<()>>,
    last_touched: Instant,
}

/// Point-in-time copy of one session, handed out to the HTTP layer.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub state: SessionState,
}

/// Shared handle to the session registry. Cheap to clone; all clones see the
/// same sessions.
#[derive(Clone)]
pub struct SessionStore {
    analyzer: Arc<dyn AnswerAnalyzer>,
    sessions: Arc<Mutex<HashMap<Uuid, ActiveSession>>>,
}

impl SessionStore {
    pub fn new(analyzer: Arc<dyn AnswerAnalyzer>) -> Self {
        Self {
            analyzer,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Registers a new session at the intro of its first question.
    pub async fn create(
        &self,
        user_id: Uuid,
        job_title: Option<String>,
        company_name: Option<String>,
        questions: Vec<Question>,
    ) -> SessionSnapshot {
        let id = Uuid::new_v4();
        let session = ActiveSession {
            user_id,
            job_title,
            company_name,
            machine: SessionState::new(questions),
            timer: None,
            last_touched: Instant::now(),
        };
        let snapshot = snapshot_of(id, &session);

        self.sessions.lock().await.insert(id, session);
        info!(
            "Practice session {id} created for user {user_id} ({} questions)",
            snapshot.state.question_count()
        );
        snapshot
    }

    /// Reads a session without mutating it (but refreshes its idle clock).
    pub async fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, AppError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        session.last_touched = Instant::now();
        Ok(snapshot_of(id, session))
    }

    /// The single mutation path for every session.
    pub async fn apply(&self, id: Uuid, action: Action) -> Result<SessionSnapshot, AppError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;

        let effects = session.machine.apply(action).map_err(reject)?;
        session.last_touched = Instant::now();
        self.execute_effects(id, session, effects);

        Ok(snapshot_of(id, session))
    }

    /// Claims a finished session for persistence. The summary check and the
    /// removal happen under one lock hold, so of two racing save calls
    /// exactly one gets the session; the other finds it gone.
    pub async fn take_completed(&self, id: Uuid) -> Result<SessionSnapshot, AppError> {
        let mut sessions = self.sessions.lock().await;
        let Entry::Occupied(entry) = sessions.entry(id) else {
            return Err(not_found(id));
        };
        if entry.get().machine.phase() != Phase::Summary {
            return Err(AppError::Conflict(
                "a session can only be saved from its summary".to_string(),
            ));
        }

        let session = entry.remove();
        if let Some(timer) = &session.timer {
            timer.abort();
        }
        info!("Practice session {id} taken for saving");
        Ok(snapshot_of(id, &session))
    }

    /// Reinserts a claimed session after a failed save, keeping its summary
    /// open for another attempt.
    pub async fn restore(&self, snapshot: SessionSnapshot) {
        let session = ActiveSession {
            user_id: snapshot.user_id,
            job_title: snapshot.job_title,
            company_name: snapshot.company_name,
            machine: snapshot.state,
            timer: None,
            last_touched: Instant::now(),
        };
        self.sessions.lock().await.insert(snapshot.id, session);
    }

    /// Drops a session and its countdown task. Returns whether it existed.
    pub async fn remove(&self, id: Uuid) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.remove(&id) {
            Some(session) => {
                if let Some(timer) = session.timer {
                    timer.abort();
                }
                info!("Practice session {id} removed");
                true
            }
            None => false,
        }
    }

    /// Evicts sessions idle for at least `ttl`. Returns how many went.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.lock().await;
        let expired: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, s)| s.last_touched.elapsed() >= ttl)
            .map(|(id, _)| *id)
            .collect();

        for id in &expired {
            if let Some(session) = sessions.remove(id) {
                if let Some(timer) = session.timer {
                    timer.abort();
                }
                warn!(
                    "Evicting idle practice session {id} (user {}, phase {:?})",
                    session.user_id,
                    session.machine.phase()
                );
            }
        }
        expired.len()
    }

    /// Spawns the background task that sweeps abandoned sessions.
    pub fn spawn_idle_sweep(&self) {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                store.evict_idle(IDLE_SESSION_TTL).await;
            }
        });
    }

    /// Executes reducer effects. Called with the registry lock held, so this
    /// must only abort and spawn tasks, never await.
    fn execute_effects(&self, id: Uuid, session: &mut ActiveSession, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::TimerCancelled => {
                    if let Some(timer) = session.timer.take() {
                        timer.abort();
                    }
                }
                Effect::TimerStarted { epoch } => {
                    if let Some(timer) = session.timer.take() {
                        timer.abort();
                    }
                    session.timer = Some(self.spawn_ticker(id, epoch));
                }
                Effect::AnalysisRequested {
                    index,
                    generation,
                    question,
                    answer,
                } => {
                    self.spawn_analysis(
                        id,
                        index,
                        generation,
                        AnalyzeRequest {
                            question,
                            answer,
                            job_title: session.job_title.clone(),
                            company_name: session.company_name.clone(),
                        },
                    );
                }
            }
        }
    }

    fn spawn_ticker(&self, id: Uuid, epoch: u64) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(TICK_INTERVAL);
            // An interval's first tick resolves immediately; consume it so
            // the countdown decrements once per TICK_INTERVAL from the start.
            ticks.tick().await;
            loop {
                ticks.tick().await;
                if !store.tick_once(id, epoch).await {
                    break;
                }
            }
        })
    }

    /// Applies one tick; returns whether the countdown should keep running.
    async fn tick_once(&self, id: Uuid, epoch: u64) -> bool {
        let mut sessions = self.sessions.lock().await;
        let Some(session) = sessions.get_mut(&id) else {
            return false;
        };

        let effects = match session.machine.apply(Action::Tick { epoch }) {
            Ok(effects) => effects,
            Err(_) => return false,
        };
        self.execute_effects(id, session, effects);

        session.machine.phase() == Phase::Question && session.machine.timer_epoch() == epoch
    }

    fn spawn_analysis(&self, id: Uuid, index: usize, generation: u64, request: AnalyzeRequest) {
        let store = self.clone();
        tokio::spawn(async move {
            let outcome = match store.analyzer.analyze(&request).await {
                Ok(analysis) => AnalysisOutcome::Succeeded(analysis),
                Err(e) => {
                    warn!("Answer analysis for session {id} failed, falling back: {e}");
                    AnalysisOutcome::Failed
                }
            };

            let arrived = Action::AnalysisArrived {
                index,
                generation,
                outcome,
            };
            if let Err(e) = store.apply(id, arrived).await {
                // Session saved or discarded while we were waiting; nothing to do.
                debug!("Dropping analysis result for session {id}: {e}");
            }
        });
    }
}

fn snapshot_of(id: Uuid, session: &ActiveSession) -> SessionSnapshot {
    SessionSnapshot {
        id,
        user_id: session.user_id,
        job_title: session.job_title.clone(),
        company_name: session.company_name.clone(),
        state: session.machine.clone(),
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Practice session {id} not found"))
}

/// Maps reducer rejections onto HTTP-facing errors: bad input is 400,
/// out-of-phase requests are 409.
fn reject(err: TransitionError) -> AppError {
    match err {
        TransitionError::EmptyAnswer => AppError::Validation(err.to_string()),
        TransitionError::InvalidAction { .. } | TransitionError::AlreadyRated => {
            AppError::Conflict(err.to_string())
        }
    }
}
