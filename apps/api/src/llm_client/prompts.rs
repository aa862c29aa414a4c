// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Coaching-voice instruction composed into every interview prompt.
pub const COACHING_INSTRUCTION: &str = "\
    CRITICAL: Write as an experienced interview coach. \
    Feedback must be specific and actionable, and must reference what the candidate \
    actually said. Never fall back to generic advice. \
    The candidate is practicing in order to improve, not to be graded harshly, \
    so keep the tone direct but encouraging.";
