//! Answer analysis — the AI evaluation seam and its deterministic fallback.
//!
//! Analysis runs off the hot path: the session runtime requests it after an
//! answer is submitted and folds the result in whenever it lands. When the
//! LLM is unreachable the session falls back to canned, length-based feedback
//! and keeps moving; an analysis failure must never stall a session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::llm_client::prompts::COACHING_INSTRUCTION;
use crate::llm_client::LlmClient;
use crate::practice::prompts::{ANALYZE_PROMPT_TEMPLATE, ANALYZE_SYSTEM};
use crate::practice::scoring::{clamp_confidence, MAX_CONFIDENCE, MIN_CONFIDENCE};

/// Answers longer than this many characters get the encouraging fallback;
/// shorter non-empty answers are nudged to add depth.
pub const FALLBACK_LENGTH_THRESHOLD: usize = 50;

const LONG_ANSWER_FEEDBACK: &str = "Good answer! Your response was well-structured and had \
    substance. Consider framing it with the STAR method (Situation, Task, Action, Result) \
    to make the impact even clearer.";

const SHORT_ANSWER_FEEDBACK: &str = "Your answer could use more depth. Expand it with a \
    concrete example: what the situation was, what you did, and what came of it.";

const EMPTY_ANSWER_FEEDBACK: &str = "You should still attempt an answer, even when unsure. \
    Interviewers want to see how you reason through a question, not just polished results.";

/// Everything the analyzer needs to evaluate one answer.
/// Also the request body for the stand-alone analyze endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
}

/// Structured evaluation of one answer. Ratings are on a 1-5 scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerAnalysis {
    pub clarity: u8,
    pub relevance: u8,
    pub overall: u8,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_response: Option<String>,
    pub feedback: String,
}

/// Pluggable answer evaluation. The production implementation calls the LLM;
/// tests swap in deterministic fakes.
#[async_trait]
pub trait AnswerAnalyzer: Send + Sync {
    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnswerAnalysis, AppError>;
}

/// LLM-backed analyzer used in production.
pub struct LlmAnswerAnalyzer {
    llm: LlmClient,
}

impl LlmAnswerAnalyzer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl AnswerAnalyzer for LlmAnswerAnalyzer {
    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnswerAnalysis, AppError> {
        let prompt = build_analyze_prompt(request);

        let analysis: AnswerAnalysis = self
            .llm
            .call_json(&prompt, ANALYZE_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Answer analysis failed: {e}")))?;

        debug!(
            "Answer analyzed: clarity={} relevance={} overall={}",
            analysis.clarity, analysis.relevance, analysis.overall
        );

        Ok(sanitize_analysis(analysis))
    }
}

fn build_analyze_prompt(request: &AnalyzeRequest) -> String {
    let job_context = match (&request.job_title, &request.company_name) {
        (Some(title), Some(company)) => {
            format!("Candidate is interviewing for {title} at {company}.")
        }
        (Some(title), None) => format!("Candidate is interviewing for a {title} role."),
        (None, Some(company)) => format!("Candidate is interviewing at {company}."),
        (None, None) => "No role context provided.".to_string(),
    };

    ANALYZE_PROMPT_TEMPLATE
        .replace("{coaching_instruction}", COACHING_INSTRUCTION)
        .replace("{job_context}", &job_context)
        .replace("{question}", &request.question)
        .replace("{answer}", &request.answer)
}

/// Clamps LLM-reported ratings onto the 1-5 scale. The prompt demands the
/// range, but a malformed rating must not corrupt score arithmetic downstream.
pub(crate) fn sanitize_analysis(mut analysis: AnswerAnalysis) -> AnswerAnalysis {
    analysis.clarity = analysis.clarity.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);
    analysis.relevance = analysis.relevance.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);
    analysis.overall = analysis.overall.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);
    analysis
}

/// Deterministic local feedback for when analysis is unavailable.
/// A pure function of answer length, so the same answer always gets the
/// same fallback message.
pub fn fallback_feedback(answer_len: usize) -> &'static str {
    if answer_len > FALLBACK_LENGTH_THRESHOLD {
        LONG_ANSWER_FEEDBACK
    } else if answer_len > 0 {
        SHORT_ANSWER_FEEDBACK
    } else {
        EMPTY_ANSWER_FEEDBACK
    }
}

/// Confidence derived from a successful analysis: the ceiling of the mean of
/// the three ratings, kept on the 1-5 scale.
pub fn derived_confidence(analysis: &AnswerAnalysis) -> u8 {
    let sum = analysis.clarity as u16 + analysis.relevance as u16 + analysis.overall as u16;
    let ceil_avg = ((sum + 2) / 3) as u8;
    clamp_confidence(ceil_avg)
}

/// Confidence carried into the next question: one higher than the derived
/// value after a strong answer (overall above 3), otherwise the derived value.
pub fn carried_confidence(derived: u8, overall: u8) -> u8 {
    if overall > 3 {
        clamp_confidence(derived + 1)
    } else {
        derived
    }
}
