//! Question sourcing: a built-in general bank plus per-role LLM generation.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::COACHING_INSTRUCTION;
use crate::llm_client::LlmClient;
use crate::practice::prompts::{GENERATE_QUESTIONS_PROMPT_TEMPLATE, GENERATE_QUESTIONS_SYSTEM};

/// One practice question. `description` says what the interviewer is probing;
/// `suggested_answer` outlines a strong response and backs the hint toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_answer: Option<String>,
}

impl Question {
    fn new(question: &str, description: &str, suggested_answer: &str) -> Self {
        Self {
            question: question.to_string(),
            description: Some(description.to_string()),
            suggested_answer: Some(suggested_answer.to_string()),
        }
    }
}

/// Questions grouped the way the client renders them. Shared by the built-in
/// bank and the generation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSet {
    pub behavioral: Vec<Question>,
    pub technical: Vec<Question>,
}

/// The built-in bank served when no role-specific set has been generated.
pub fn question_bank() -> QuestionSet {
    QuestionSet {
        behavioral: vec![
            Question::new(
                "Tell me about yourself and your background.",
                "An opener that tests whether you can pitch yourself in under two minutes",
                "Lead with your current role, pick two or three relevant highlights, and end \
                 with why this role is the logical next step.",
            ),
            Question::new(
                "Describe a time you had to deliver under a tight deadline.",
                "Probes prioritization and composure under pressure",
                "Use STAR: name the deadline, what you cut or negotiated, the actions you took, \
                 and what shipped.",
            ),
            Question::new(
                "Tell me about a time you disagreed with a teammate or manager.",
                "Probes conflict handling and whether you can disagree without friction",
                "Show that you argued from evidence, listened, and committed to the outcome \
                 once a decision was made.",
            ),
            Question::new(
                "What is a professional failure you learned from?",
                "Tests self-awareness; interviewers distrust candidates with no failures",
                "Pick a real failure with real stakes, own your part plainly, and spend most \
                 of the answer on what changed in how you work.",
            ),
            Question::new(
                "Why do you want to work here?",
                "Checks whether you researched the company or are mass-applying",
                "Tie one concrete thing about the company's product or stack to your own \
                 experience and goals.",
            ),
        ],
        technical: vec![
            Question::new(
                "Walk me through a system you designed or significantly shaped.",
                "Probes architectural judgement and ownership",
                "Sketch the constraints first, then the design, then one tradeoff you would \
                 make differently today.",
            ),
            Question::new(
                "How do you approach debugging a production incident?",
                "Probes operational maturity",
                "Describe triage order: stop the bleeding, gather evidence, form a hypothesis, \
                 verify, then write up the fix and prevention.",
            ),
            Question::new(
                "How do you decide what to test, and at which level?",
                "Probes engineering discipline beyond writing code that runs",
                "Talk about testing behavior at boundaries, fast unit coverage for logic, and \
                 a thin layer of integration tests for wiring.",
            ),
            Question::new(
                "Tell me about the most complex performance problem you have solved.",
                "Probes depth: measurement first or guesswork",
                "Start with how you measured, name the bottleneck, and quantify the before \
                 and after.",
            ),
            Question::new(
                "How do you keep your skills current?",
                "A softball that still reveals genuine curiosity or its absence",
                "Name specific sources and one thing you learned recently that changed how \
                 you build.",
            ),
        ],
    }
}

/// Generates a role-specific question set via the LLM.
/// Failures surface to the caller; there is no canned fallback here.
pub async fn generate_questions(
    job_title: &str,
    skills: &[String],
    llm: &LlmClient,
) -> Result<QuestionSet, AppError> {
    let skills_line = if skills.is_empty() {
        "Not specified".to_string()
    } else {
        skills.join(", ")
    };

    let prompt = GENERATE_QUESTIONS_PROMPT_TEMPLATE
        .replace("{coaching_instruction}", COACHING_INSTRUCTION)
        .replace("{job_title}", job_title)
        .replace("{skills}", &skills_line);

    let set: QuestionSet = llm
        .call_json(&prompt, GENERATE_QUESTIONS_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Question generation failed: {e}")))?;

    if set.behavioral.is_empty() && set.technical.is_empty() {
        return Err(AppError::Llm(
            "Question generation returned an empty set".to_string(),
        ));
    }

    info!(
        "Generated {} behavioral / {} technical questions for '{}'",
        set.behavioral.len(),
        set.technical.len(),
        job_title
    );

    Ok(set)
}
