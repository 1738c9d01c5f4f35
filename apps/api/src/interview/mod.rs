// Interview core: question generation with dedup and fallback, answer scoring, chat.
// All capability calls go through llm_client::TextGenerator.

use std::time::Duration;

use anyhow::{ensure, Result};

pub mod chat;
pub mod evaluator;
pub mod fallback;
pub mod generator;
pub mod prompts;
pub mod similarity;

/// Questions at or above this similarity to a prior question count as repeats.
/// Empirical; tune through `QUESTION_SIMILARITY_THRESHOLD`.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.72;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
/// Prior questions enumerated in the generation prompt.
pub const DEFAULT_HISTORY_LIMIT: usize = 12;
/// Shown-but-unanswered questions kept in memory per session.
pub const DEFAULT_SHOWN_LIMIT: usize = 24;
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(30);
/// In-memory session state untouched for this long is dropped.
pub const DEFAULT_SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_MAX_TRACKED_SESSIONS: usize = 10_000;

/// Tuning knobs for the generation loop and the session tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub similarity_threshold: f64,
    pub max_attempts: u32,
    pub history_limit: usize,
    pub shown_limit: usize,
    pub llm_timeout: Duration,
    pub session_idle_ttl: Duration,
    pub max_tracked_sessions: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            shown_limit: DEFAULT_SHOWN_LIMIT,
            llm_timeout: DEFAULT_LLM_TIMEOUT,
            session_idle_ttl: DEFAULT_SESSION_IDLE_TTL,
            max_tracked_sessions: DEFAULT_MAX_TRACKED_SESSIONS,
        }
    }
}

impl GenerationSettings {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0,
            "similarity threshold must be in (0, 1], got {}",
            self.similarity_threshold
        );
        ensure!(self.max_attempts >= 1, "max attempts must be at least 1");
        ensure!(self.history_limit >= 1, "history limit must be at least 1");
        ensure!(self.shown_limit >= 1, "shown question limit must be at least 1");
        ensure!(
            self.llm_timeout >= Duration::from_secs(1),
            "LLM timeout must be at least one second"
        );
        ensure!(
            self.session_idle_ttl >= Duration::from_secs(1),
            "session idle TTL must be at least one second"
        );
        ensure!(
            self.max_tracked_sessions >= 1,
            "max tracked sessions must be at least 1"
        );
        Ok(())
    }
}
