// Interview practice engine.
// Implements: question sourcing, the session state machine, its async runtime
// (countdown + analysis tasks), scoring, and completed-session persistence.
// All LLM calls go through llm_client — no direct Anthropic API calls here.

pub mod analysis;
pub mod handlers;
pub mod history;
pub mod machine;
pub mod prompts;
pub mod questions;
pub mod runtime;
pub mod scoring;
