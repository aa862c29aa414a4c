//! The practice-session state machine.
//!
//! A session walks `Intro -> Question -> Feedback` per question and ends in
//! `Summary` after the last one. Every mutation goes through one reducer,
//! [`SessionState::apply`], which is pure and synchronous: no I/O, no clocks,
//! no locks. Anything that must touch the outside world (countdown tasks,
//! analysis requests) comes back as an [`Effect`] for the runtime to execute.
//!
//! Time and analysis results re-enter as actions (`Tick`, `AnalysisArrived`)
//! carrying the epoch or generation they were issued under. The reducer
//! discards stale ones, so an aborted countdown or a response for an
//! abandoned question can never corrupt the session.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::practice::analysis::{
    carried_confidence, derived_confidence, fallback_feedback, AnswerAnalysis,
};
use crate::practice::questions::Question;
use crate::practice::scoring::{
    advance_bonus, apply_skip_penalty, clamp_confidence, rating_points, HELPFUL_RATING_BONUS,
    INITIAL_CONFIDENCE, QUESTION_TIME_LIMIT_SECS,
};

/// Stored as feedback when the countdown expires on a drafted answer.
/// No analysis is requested for it.
pub const TIME_EXPIRED_FEEDBACK: &str = "Time expired, so your answer went in as drafted. \
    Practice landing your key points early; interviewers rarely extend the clock.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Intro,
    Question,
    Feedback,
    Summary,
}

/// Per-question record. One ordered collection holds everything known about
/// a question: its text, the draft or submitted answer, feedback, the full
/// analysis when one landed, and the confidence meter (1-5).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub question: Question,
    pub answer: Option<String>,
    pub feedback: Option<String>,
    pub analysis: Option<AnswerAnalysis>,
    pub confidence: u8,
    pub rated: bool,
}

impl QuestionRecord {
    fn new(question: Question) -> Self {
        Self {
            question,
            answer: None,
            feedback: None,
            analysis: None,
            confidence: INITIAL_CONFIDENCE,
            rated: false,
        }
    }
}

/// Everything that can happen to a session. `Tick` and `AnalysisArrived` are
/// driver-internal; the HTTP layer only ever constructs the client actions.
#[derive(Debug, Clone)]
pub enum Action {
    Start,
    SaveDraft { text: String },
    SubmitAnswer { text: String },
    Skip,
    ToggleHint,
    RateFeedback { helpful: bool },
    Advance,
    Tick { epoch: u64 },
    AnalysisArrived {
        index: usize,
        generation: u64,
        outcome: AnalysisOutcome,
    },
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::SaveDraft { .. } => "saveDraft",
            Action::SubmitAnswer { .. } => "submitAnswer",
            Action::Skip => "skip",
            Action::ToggleHint => "toggleHint",
            Action::RateFeedback { .. } => "rateFeedback",
            Action::Advance => "advance",
            Action::Tick { .. } => "tick",
            Action::AnalysisArrived { .. } => "analysisArrived",
        }
    }
}

/// What the analysis task brought back. Failure carries no payload; the
/// reducer substitutes the deterministic fallback feedback.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Succeeded(AnswerAnalysis),
    Failed,
}

/// Side effects the runtime must execute after a successful transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    TimerStarted { epoch: u64 },
    TimerCancelled,
    AnalysisRequested {
        index: usize,
        generation: u64,
        question: String,
        answer: String,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error("'{action}' is not valid in the {phase:?} phase")]
    InvalidAction { action: &'static str, phase: Phase },

    #[error("answer must not be empty")]
    EmptyAnswer,

    #[error("feedback for this question has already been rated")]
    AlreadyRated,
}

/// Full session state. Mutated only through [`SessionState::apply`].
#[derive(Debug, Clone)]
pub struct SessionState {
    records: Vec<QuestionRecord>,
    current: usize,
    phase: Phase,
    score: u32,
    time_remaining: u16,
    hint_visible: bool,
    timer_epoch: u64,
    analysis_generation: u64,
    pending_analysis: Option<(usize, u64)>,
}

impl SessionState {
    /// A fresh session at the intro of the first question.
    /// Callers validate that `questions` is non-empty.
    pub fn new(questions: Vec<Question>) -> Self {
        debug_assert!(!questions.is_empty(), "session needs at least one question");
        Self {
            records: questions.into_iter().map(QuestionRecord::new).collect(),
            current: 0,
            phase: Phase::Intro,
            score: 0,
            time_remaining: QUESTION_TIME_LIMIT_SECS,
            hint_visible: false,
            timer_epoch: 0,
            analysis_generation: 0,
            pending_analysis: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn time_remaining(&self) -> u16 {
        self.time_remaining
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn question_count(&self) -> usize {
        self.records.len()
    }

    pub fn hint_visible(&self) -> bool {
        self.hint_visible
    }

    /// True while an analysis request for the current question is in flight.
    pub fn analysis_pending(&self) -> bool {
        self.pending_analysis.is_some()
    }

    pub fn records(&self) -> &[QuestionRecord] {
        &self.records
    }

    pub fn current_record(&self) -> &QuestionRecord {
        &self.records[self.current]
    }

    pub(crate) fn timer_epoch(&self) -> u64 {
        self.timer_epoch
    }

    /// The one reducer. Returns the effects the runtime must execute, or a
    /// typed rejection that leaves the state untouched.
    pub fn apply(&mut self, action: Action) -> Result<Vec<Effect>, TransitionError> {
        match (self.phase, action) {
            (Phase::Intro, Action::Start) => Ok(self.start_question()),

            (Phase::Question, Action::SaveDraft { text }) => {
                self.records[self.current].answer = if text.is_empty() { None } else { Some(text) };
                Ok(vec![])
            }
            (Phase::Question, Action::SubmitAnswer { text }) => self.submit_answer(text),
            (Phase::Question, Action::Skip) => Ok(self.skip_current()),
            (Phase::Question, Action::ToggleHint) => {
                self.hint_visible = !self.hint_visible;
                Ok(vec![])
            }
            (Phase::Question, Action::Tick { epoch }) => Ok(self.tick(epoch)),
            // A tick that raced a phase exit lands here; drop it.
            (_, Action::Tick { .. }) => Ok(vec![]),

            (Phase::Feedback, Action::RateFeedback { helpful }) => self.rate_feedback(helpful),
            (Phase::Feedback, Action::Advance) => Ok(self.advance()),
            (
                Phase::Feedback,
                Action::AnalysisArrived {
                    index,
                    generation,
                    outcome,
                },
            ) => Ok(self.fold_analysis(index, generation, outcome)),
            // An analysis that landed after its question was abandoned; drop it.
            (_, Action::AnalysisArrived { .. }) => Ok(vec![]),

            (phase, action) => Err(TransitionError::InvalidAction {
                action: action.name(),
                phase,
            }),
        }
    }

    fn start_question(&mut self) -> Vec<Effect> {
        self.phase = Phase::Question;
        self.time_remaining = QUESTION_TIME_LIMIT_SECS;
        self.hint_visible = false;
        self.timer_epoch += 1;
        vec![Effect::TimerStarted {
            epoch: self.timer_epoch,
        }]
    }

    fn submit_answer(&mut self, text: String) -> Result<Vec<Effect>, TransitionError> {
        if text.trim().is_empty() {
            return Err(TransitionError::EmptyAnswer);
        }

        let index = self.current;
        self.records[index].answer = Some(text.clone());
        self.phase = Phase::Feedback;
        self.analysis_generation += 1;
        self.pending_analysis = Some((index, self.analysis_generation));

        Ok(vec![
            Effect::TimerCancelled,
            Effect::AnalysisRequested {
                index,
                generation: self.analysis_generation,
                question: self.records[index].question.question.clone(),
                answer: text,
            },
        ])
    }

    fn tick(&mut self, epoch: u64) -> Vec<Effect> {
        if epoch != self.timer_epoch {
            return vec![];
        }

        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining > 0 {
            return vec![];
        }

        // The countdown hit zero; the session moves on without the candidate.
        let has_answer = self.records[self.current]
            .answer
            .as_deref()
            .is_some_and(|a| !a.trim().is_empty());

        if has_answer {
            // The drafted answer stands, with canned feedback and no analysis.
            self.records[self.current].feedback = Some(TIME_EXPIRED_FEEDBACK.to_string());
            self.phase = Phase::Feedback;
        } else {
            // Nothing to grade: skip through without touching the score.
            self.goto_next_or_summary();
        }
        vec![Effect::TimerCancelled]
    }

    fn skip_current(&mut self) -> Vec<Effect> {
        self.score = apply_skip_penalty(self.score);
        self.goto_next_or_summary();
        vec![Effect::TimerCancelled]
    }

    fn rate_feedback(&mut self, helpful: bool) -> Result<Vec<Effect>, TransitionError> {
        let record = &mut self.records[self.current];
        if record.rated {
            return Err(TransitionError::AlreadyRated);
        }
        record.rated = true;
        if helpful {
            self.score += HELPFUL_RATING_BONUS;
        }
        Ok(vec![])
    }

    fn advance(&mut self) -> Vec<Effect> {
        let record = &self.records[self.current];
        if record.feedback.is_some() {
            self.score += advance_bonus(self.time_remaining, record.confidence);
        }
        self.goto_next_or_summary();
        vec![]
    }

    fn fold_analysis(
        &mut self,
        index: usize,
        generation: u64,
        outcome: AnalysisOutcome,
    ) -> Vec<Effect> {
        if self.pending_analysis != Some((index, generation)) {
            // Stale: the candidate moved on before this response landed.
            return vec![];
        }
        self.pending_analysis = None;

        match outcome {
            AnalysisOutcome::Succeeded(analysis) => {
                self.score += rating_points(analysis.overall);

                let confidence = derived_confidence(&analysis);
                self.records[index].confidence = confidence;
                if let Some(next) = self.records.get_mut(index + 1) {
                    next.confidence = carried_confidence(confidence, analysis.overall);
                }

                self.records[index].feedback = Some(analysis.feedback.clone());
                self.records[index].analysis = Some(analysis);
            }
            AnalysisOutcome::Failed => {
                let answer_len = self.records[index]
                    .answer
                    .as_deref()
                    .map_or(0, |a| a.chars().count());
                self.records[index].feedback = Some(fallback_feedback(answer_len).to_string());
                if let Some(next) = self.records.get_mut(index + 1) {
                    next.confidence = clamp_confidence(next.confidence + 1);
                }
            }
        }
        vec![]
    }

    fn goto_next_or_summary(&mut self) {
        self.pending_analysis = None;
        if self.current + 1 < self.records.len() {
            self.current += 1;
            self.phase = Phase::Intro;
        } else {
            self.phase = Phase::Summary;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::practice::scoring::SKIP_PENALTY;

    fn make_questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question {
                question: format!("Question {i}"),
                description: None,
                suggested_answer: Some(format!("Hint {i}")),
            })
            .collect()
    }

    fn make_state(n: usize) -> SessionState {
        SessionState::new(make_questions(n))
    }

    fn make_analysis(clarity: u8, relevance: u8, overall: u8) -> AnswerAnalysis {
        AnswerAnalysis {
            clarity,
            relevance,
            overall,
            strengths: vec!["Clear structure".to_string()],
            areas_for_improvement: vec!["Quantify the result".to_string()],
            suggested_response: None,
            feedback: "Strong answer; tie it off with the outcome.".to_string(),
        }
    }

    /// Start the current question, asserting the timer effect.
    fn start(state: &mut SessionState) -> u64 {
        let effects = state.apply(Action::Start).unwrap();
        let epoch = state.timer_epoch;
        assert_eq!(effects, vec![Effect::TimerStarted { epoch }]);
        epoch
    }

    /// Submit a non-empty answer, returning the analysis generation it opened.
    fn submit(state: &mut SessionState, text: &str) -> u64 {
        let effects = state
            .apply(Action::SubmitAnswer {
                text: text.to_string(),
            })
            .unwrap();
        assert_eq!(effects[0], Effect::TimerCancelled);
        match &effects[1] {
            Effect::AnalysisRequested { generation, .. } => *generation,
            other => panic!("Expected analysis request, got {other:?}"),
        }
    }

    fn deliver(state: &mut SessionState, generation: u64, analysis: AnswerAnalysis) {
        state
            .apply(Action::AnalysisArrived {
                index: state.current_index(),
                generation,
                outcome: AnalysisOutcome::Succeeded(analysis),
            })
            .unwrap();
    }

    fn run_ticks(state: &mut SessionState, epoch: u64, n: u32) {
        for _ in 0..n {
            state.apply(Action::Tick { epoch }).unwrap();
        }
    }

    #[test]
    fn test_fresh_session() {
        let state = make_state(3);
        assert_eq!(state.phase(), Phase::Intro);
        assert_eq!(state.current_index(), 0);
        assert_eq!(state.score(), 0);
        assert_eq!(state.time_remaining(), QUESTION_TIME_LIMIT_SECS);
        assert_eq!(state.current_record().confidence, INITIAL_CONFIDENCE);
        assert!(!state.hint_visible());
    }

    #[test]
    fn test_start_resets_clock_and_hint() {
        let mut state = make_state(2);
        start(&mut state);
        state.apply(Action::ToggleHint).unwrap();
        assert!(state.hint_visible());
        let gen = submit(&mut state, "An answer");
        deliver(&mut state, gen, make_analysis(4, 4, 4));
        state.apply(Action::Advance).unwrap();

        // Second question starts with a full clock, hidden hint, new epoch
        assert_eq!(state.phase(), Phase::Intro);
        let epoch = start(&mut state);
        assert_eq!(epoch, 2);
        assert_eq!(state.time_remaining(), QUESTION_TIME_LIMIT_SECS);
        assert!(!state.hint_visible());
    }

    #[test]
    fn test_actions_rejected_outside_their_phase() {
        let mut state = make_state(1);
        let err = state
            .apply(Action::SubmitAnswer {
                text: "early".to_string(),
            })
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidAction {
                action: "submitAnswer",
                phase: Phase::Intro
            }
        );

        start(&mut state);
        let err = state.apply(Action::Start).unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidAction {
                action: "start",
                phase: Phase::Question
            }
        );
    }

    #[test]
    fn test_submit_rejects_empty_and_whitespace_answers() {
        let mut state = make_state(1);
        start(&mut state);
        assert_eq!(
            state.apply(Action::SubmitAnswer {
                text: String::new()
            }),
            Err(TransitionError::EmptyAnswer)
        );
        assert_eq!(
            state.apply(Action::SubmitAnswer {
                text: "   ".to_string()
            }),
            Err(TransitionError::EmptyAnswer)
        );
        // Still answerable after the rejections
        assert_eq!(state.phase(), Phase::Question);
        submit(&mut state, "A real answer");
        assert_eq!(state.phase(), Phase::Feedback);
    }

    #[test]
    fn test_submit_requests_analysis_for_current_question() {
        let mut state = make_state(2);
        start(&mut state);
        let effects = state
            .apply(Action::SubmitAnswer {
                text: "My answer".to_string(),
            })
            .unwrap();
        assert_eq!(
            effects,
            vec![
                Effect::TimerCancelled,
                Effect::AnalysisRequested {
                    index: 0,
                    generation: 1,
                    question: "Question 0".to_string(),
                    answer: "My answer".to_string(),
                },
            ]
        );
        assert!(state.analysis_pending());
    }

    #[test]
    fn test_tick_counts_down_only_for_current_epoch() {
        let mut state = make_state(1);
        let epoch = start(&mut state);
        run_ticks(&mut state, epoch, 5);
        assert_eq!(state.time_remaining(), 115);

        // A tick from a dead countdown changes nothing
        state.apply(Action::Tick { epoch: epoch + 7 }).unwrap();
        assert_eq!(state.time_remaining(), 115);
    }

    #[test]
    fn test_expiry_with_draft_moves_to_feedback_without_analysis() {
        let mut state = make_state(1);
        let epoch = start(&mut state);
        state
            .apply(Action::SaveDraft {
                text: "Half-finished thought".to_string(),
            })
            .unwrap();

        run_ticks(&mut state, epoch, 119);
        assert_eq!(state.phase(), Phase::Question);
        let effects = state.apply(Action::Tick { epoch }).unwrap();

        assert_eq!(effects, vec![Effect::TimerCancelled]);
        assert_eq!(state.phase(), Phase::Feedback);
        assert_eq!(
            state.current_record().feedback.as_deref(),
            Some(TIME_EXPIRED_FEEDBACK)
        );
        assert!(!state.analysis_pending());
    }

    #[test]
    fn test_expiry_without_answer_skips_through_without_penalty() {
        let mut state = make_state(2);
        let epoch = start(&mut state);
        run_ticks(&mut state, epoch, 120);

        assert_eq!(state.phase(), Phase::Intro);
        assert_eq!(state.current_index(), 1);
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn test_expiry_on_last_question_lands_in_summary() {
        let mut state = make_state(1);
        let epoch = start(&mut state);
        run_ticks(&mut state, epoch, 120);
        assert_eq!(state.phase(), Phase::Summary);
    }

    #[test]
    fn test_whitespace_draft_counts_as_unanswered_at_expiry() {
        let mut state = make_state(2);
        let epoch = start(&mut state);
        state
            .apply(Action::SaveDraft {
                text: "   ".to_string(),
            })
            .unwrap();
        run_ticks(&mut state, epoch, 120);
        assert_eq!(state.current_index(), 1);
        assert_eq!(state.phase(), Phase::Intro);
    }

    #[test]
    fn test_skip_deducts_fifty_and_floors_at_zero() {
        let mut state = make_state(2);
        start(&mut state);
        let effects = state.apply(Action::Skip).unwrap();
        assert_eq!(effects, vec![Effect::TimerCancelled]);
        assert_eq!(state.score(), 0); // 0 - 50 saturates
        assert_eq!(state.current_index(), 1);
        assert_eq!(state.phase(), Phase::Intro);
    }

    #[test]
    fn test_skip_last_question_ends_in_summary() {
        let mut state = make_state(1);
        start(&mut state);
        state.apply(Action::Skip).unwrap();
        assert_eq!(state.phase(), Phase::Summary);
    }

    #[test]
    fn test_analysis_success_awards_overall_times_twenty() {
        let mut state = make_state(1);
        start(&mut state);
        let gen = submit(&mut state, "A thorough answer");
        deliver(&mut state, gen, make_analysis(5, 5, 5));
        assert_eq!(state.score(), 100);
        assert_eq!(
            state.current_record().feedback.as_deref(),
            Some("Strong answer; tie it off with the outcome.")
        );
        assert!(state.current_record().analysis.is_some());
        assert!(!state.analysis_pending());
    }

    #[test]
    fn test_analysis_updates_current_and_next_confidence() {
        let mut state = make_state(2);
        start(&mut state);
        let gen = submit(&mut state, "A solid answer");
        // mean of (4, 4, 4) -> 4; overall > 3 carries 5 into the next question
        deliver(&mut state, gen, make_analysis(4, 4, 4));
        assert_eq!(state.records()[0].confidence, 4);
        assert_eq!(state.records()[1].confidence, 5);
    }

    #[test]
    fn test_weak_analysis_carries_confidence_unbumped() {
        let mut state = make_state(2);
        start(&mut state);
        let gen = submit(&mut state, "A shaky answer");
        // mean of (2, 2, 2) -> 2; overall <= 3 carries 2 as-is
        deliver(&mut state, gen, make_analysis(2, 2, 2));
        assert_eq!(state.records()[0].confidence, 2);
        assert_eq!(state.records()[1].confidence, 2);
    }

    #[test]
    fn test_confidence_stays_on_scale_at_extremes() {
        for overall in 1..=5u8 {
            let mut state = make_state(2);
            start(&mut state);
            let gen = submit(&mut state, "Answer");
            deliver(&mut state, gen, make_analysis(5, 5, overall));
            for record in state.records() {
                assert!(
                    (1..=5).contains(&record.confidence),
                    "confidence {} escaped the scale for overall={overall}",
                    record.confidence
                );
            }
        }
    }

    #[test]
    fn test_analysis_failure_uses_length_fallback() {
        let mut state = make_state(2);
        start(&mut state);
        let gen = submit(&mut state, "short");
        state
            .apply(Action::AnalysisArrived {
                index: 0,
                generation: gen,
                outcome: AnalysisOutcome::Failed,
            })
            .unwrap();

        let feedback = state.records()[0].feedback.as_deref().unwrap();
        assert!(feedback.contains("more depth"), "Got: {feedback}");
        // No rating points on the fallback path
        assert_eq!(state.score(), 0);
        // Next question still gets the +1 encouragement bump
        assert_eq!(state.records()[1].confidence, 4);
        assert!(state.records()[0].analysis.is_none());
    }

    #[test]
    fn test_analysis_failure_on_long_answer_mentions_star() {
        let mut state = make_state(1);
        start(&mut state);
        let long_answer = "x".repeat(60);
        let gen = submit(&mut state, &long_answer);
        state
            .apply(Action::AnalysisArrived {
                index: 0,
                generation: gen,
                outcome: AnalysisOutcome::Failed,
            })
            .unwrap();
        let feedback = state.records()[0].feedback.as_deref().unwrap();
        assert!(feedback.contains("STAR"), "Got: {feedback}");
    }

    #[test]
    fn test_stale_analysis_is_discarded() {
        let mut state = make_state(2);
        start(&mut state);
        let gen = submit(&mut state, "First answer");

        // Candidate advances before the response lands
        state.apply(Action::Advance).unwrap();
        assert_eq!(state.current_index(), 1);

        state
            .apply(Action::AnalysisArrived {
                index: 0,
                generation: gen,
                outcome: AnalysisOutcome::Succeeded(make_analysis(5, 5, 5)),
            })
            .unwrap();

        // Nothing changed: no points, no stored analysis, no carry-over
        assert_eq!(state.score(), 0);
        assert!(state.records()[0].analysis.is_none());
        assert_eq!(state.records()[1].confidence, INITIAL_CONFIDENCE);
    }

    #[test]
    fn test_analysis_for_older_generation_is_discarded() {
        let mut state = make_state(2);
        start(&mut state);
        let first_gen = submit(&mut state, "First answer");
        state.apply(Action::Advance).unwrap();
        start(&mut state);
        let second_gen = submit(&mut state, "Second answer");
        assert_ne!(first_gen, second_gen);

        // The first question's response shows up late
        state
            .apply(Action::AnalysisArrived {
                index: 0,
                generation: first_gen,
                outcome: AnalysisOutcome::Succeeded(make_analysis(5, 5, 5)),
            })
            .unwrap();
        assert_eq!(state.score(), 0);
        assert!(state.analysis_pending()); // the live request is untouched

        // The live one still folds in normally
        state
            .apply(Action::AnalysisArrived {
                index: 1,
                generation: second_gen,
                outcome: AnalysisOutcome::Succeeded(make_analysis(4, 4, 4)),
            })
            .unwrap();
        assert_eq!(state.score(), 80);
    }

    #[test]
    fn test_rate_feedback_awards_ten_once() {
        let mut state = make_state(1);
        start(&mut state);
        let gen = submit(&mut state, "Answer");
        deliver(&mut state, gen, make_analysis(4, 4, 4));
        let base = state.score();

        state.apply(Action::RateFeedback { helpful: true }).unwrap();
        assert_eq!(state.score(), base + 10);

        let err = state
            .apply(Action::RateFeedback { helpful: true })
            .unwrap_err();
        assert_eq!(err, TransitionError::AlreadyRated);
        assert_eq!(state.score(), base + 10);
    }

    #[test]
    fn test_unhelpful_rating_scores_nothing_but_still_counts() {
        let mut state = make_state(1);
        start(&mut state);
        let gen = submit(&mut state, "Answer");
        deliver(&mut state, gen, make_analysis(4, 4, 4));
        let base = state.score();

        state
            .apply(Action::RateFeedback { helpful: false })
            .unwrap();
        assert_eq!(state.score(), base);
        assert_eq!(
            state.apply(Action::RateFeedback { helpful: true }),
            Err(TransitionError::AlreadyRated)
        );
    }

    #[test]
    fn test_advance_without_feedback_awards_nothing() {
        let mut state = make_state(2);
        start(&mut state);
        submit(&mut state, "Answer");
        // Analysis has not landed; no feedback on the record yet
        state.apply(Action::Advance).unwrap();
        assert_eq!(state.score(), 0);
        assert_eq!(state.current_index(), 1);
    }

    #[test]
    fn test_advance_bonus_uses_frozen_clock_and_confidence() {
        let mut state = make_state(1);
        let epoch = start(&mut state);
        run_ticks(&mut state, epoch, 20); // 100 seconds left
        let gen = submit(&mut state, "Answer");
        deliver(&mut state, gen, make_analysis(4, 4, 4)); // +80, confidence 4

        state.apply(Action::Advance).unwrap();
        // 80 rating + 100 base + 100/10 + 4*5
        assert_eq!(state.score(), 80 + 100 + 10 + 20);
        assert_eq!(state.phase(), Phase::Summary);
    }

    #[test]
    fn test_canned_expiry_feedback_still_earns_advance_bonus() {
        let mut state = make_state(1);
        let epoch = start(&mut state);
        state
            .apply(Action::SaveDraft {
                text: "Drafted in time".to_string(),
            })
            .unwrap();
        run_ticks(&mut state, epoch, 120);
        assert_eq!(state.phase(), Phase::Feedback);

        state.apply(Action::Advance).unwrap();
        // No rating points, but the advance bonus applies: clock is at zero
        assert_eq!(state.score(), 100 + 0 + INITIAL_CONFIDENCE as u32 * 5);
    }

    #[test]
    fn test_full_walkthrough_accumulates_in_order() {
        let mut state = make_state(3);
        let mut expected = 0u32;

        for i in 0..3 {
            assert_eq!(state.current_index(), i);
            start(&mut state);
            let gen = submit(&mut state, "A complete answer");
            deliver(&mut state, gen, make_analysis(4, 4, 4));
            expected += 80; // overall 4 * 20
            assert_eq!(state.score(), expected);

            state.apply(Action::Advance).unwrap();
            expected += 100 + 12 + 20; // full clock, confidence 4
            assert_eq!(state.score(), expected);
        }

        assert_eq!(state.phase(), Phase::Summary);
        assert_eq!(state.score(), 3 * 80 + 3 * 132);
    }

    #[test]
    fn test_skip_then_answer_session() {
        let mut state = make_state(2);
        start(&mut state);
        state.apply(Action::Skip).unwrap();
        assert_eq!(state.score(), 0);

        start(&mut state);
        let gen = submit(&mut state, "Second time's the charm");
        deliver(&mut state, gen, make_analysis(4, 4, 4));
        assert_eq!(state.score(), 80);

        state.apply(Action::Advance).unwrap();
        assert_eq!(state.phase(), Phase::Summary);
        assert_eq!(state.score(), 80 + 100 + 12 + 20);

        // The skipped question's record survives untouched for the summary
        assert!(state.records()[0].answer.is_none());
        assert!(state.records()[0].feedback.is_none());
    }

    #[test]
    fn test_summary_rejects_client_actions() {
        let mut state = make_state(1);
        start(&mut state);
        state.apply(Action::Skip).unwrap();
        assert_eq!(state.phase(), Phase::Summary);

        for action in [
            Action::Start,
            Action::Skip,
            Action::Advance,
            Action::ToggleHint,
            Action::RateFeedback { helpful: true },
            Action::SubmitAnswer {
                text: "too late".to_string(),
            },
        ] {
            let name = match state.apply(action).unwrap_err() {
                TransitionError::InvalidAction { phase, action } => {
                    assert_eq!(phase, Phase::Summary);
                    action
                }
                other => panic!("Expected InvalidAction, got {other:?}"),
            };
            assert!(!name.is_empty());
        }

        // Driver-internal strays are dropped silently
        assert_eq!(state.apply(Action::Tick { epoch: 1 }), Ok(vec![]));
        assert_eq!(state.phase(), Phase::Summary);
    }

    #[test]
    fn test_save_draft_overwrites_and_clears() {
        let mut state = make_state(1);
        start(&mut state);
        state
            .apply(Action::SaveDraft {
                text: "v1".to_string(),
            })
            .unwrap();
        assert_eq!(state.current_record().answer.as_deref(), Some("v1"));
        state
            .apply(Action::SaveDraft {
                text: "v2".to_string(),
            })
            .unwrap();
        assert_eq!(state.current_record().answer.as_deref(), Some("v2"));
        state
            .apply(Action::SaveDraft {
                text: String::new(),
            })
            .unwrap();
        assert!(state.current_record().answer.is_none());
    }

    #[test]
    fn test_skip_penalty_applies_after_banked_points() {
        let mut state = make_state(2);
        start(&mut state);
        let gen = submit(&mut state, "Answer");
        deliver(&mut state, gen, make_analysis(5, 5, 5)); // 100 points
        state.apply(Action::Advance).unwrap(); // +100 +12 +25

        start(&mut state);
        state.apply(Action::Skip).unwrap();
        assert_eq!(state.score(), 237 - SKIP_PENALTY);
        assert_eq!(state.phase(), Phase::Summary);
    }
}
