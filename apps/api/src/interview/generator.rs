//! Question generator: asks the capability for the next interview question.
//!
//! Flow: build prompt (outline + recent history) → generate → reject near-duplicates
//! of history and retry with a stronger directive → fall back to the canned bank
//! when the capability fails, times out, or keeps repeating itself.
//!
//! `next_question` is total: every failure is absorbed and logged, and some
//! question text is always returned. Persisting the question is the caller's job.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::CoreFailure;
use crate::interview::fallback::{pick_fallback, Topic};
use crate::interview::prompts::{
    fill_outline, AVOID_REPEAT_HEADER, QUESTION_PROMPT_TEMPLATE, SUBSTANTIALLY_DIFFERENT_DIRECTIVE,
};
use crate::interview::similarity::{closest_match, normalize};
use crate::interview::GenerationSettings;
use crate::llm_client::prompts::SINGLE_QUESTION_INSTRUCTION;
use crate::llm_client::{generate_within, TextGenerator};
use crate::models::outline::InterviewOutline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    GenerationUnavailable,
    DuplicatesExhausted,
}

impl FallbackReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FallbackReason::GenerationUnavailable => "generation_unavailable",
            FallbackReason::DuplicatesExhausted => "duplicates_exhausted",
        }
    }
}

/// Where a shown question came from. Recorded with the asked question for audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionSource {
    Generated { attempts: u32 },
    Fallback { topic: Topic, reason: FallbackReason },
}

impl QuestionSource {
    /// Compact tag stored on the asked-question row.
    pub fn tag(&self) -> String {
        match self {
            QuestionSource::Generated { .. } => "generated".to_string(),
            QuestionSource::Fallback { topic, reason } => {
                format!("fallback:{}:{}", topic.as_str(), reason.as_str())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedQuestion {
    pub text: String,
    pub source: QuestionSource,
}

pub struct QuestionGenerator {
    llm: Arc<dyn TextGenerator>,
    settings: GenerationSettings,
    rng: Mutex<StdRng>,
}

impl QuestionGenerator {
    pub fn new(llm: Arc<dyn TextGenerator>, settings: GenerationSettings) -> Self {
        Self::with_rng(llm, settings, StdRng::from_entropy())
    }

    pub fn with_rng(llm: Arc<dyn TextGenerator>, settings: GenerationSettings, rng: StdRng) -> Self {
        Self {
            llm,
            settings,
            rng: Mutex::new(rng),
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Returns the next question for `outline`.
    ///
    /// `history` holds previously shown question texts, most recent first.
    pub async fn next_question(
        &self,
        outline: &InterviewOutline,
        history: &[String],
    ) -> GeneratedQuestion {
        let mut prompt = build_question_prompt(outline, history, self.settings.history_limit);
        debug!("Question prompt for interview {}:\n{}", outline.id, prompt);

        let history_norm: Vec<String> = history
            .iter()
            .map(|q| normalize(q))
            .filter(|q| !q.is_empty())
            .collect();

        for attempt in 1..=self.settings.max_attempts {
            let text = match generate_within(self.llm.as_ref(), &prompt, self.settings.llm_timeout)
                .await
            {
                Ok(raw) => clean_question(&raw),
                Err(e) => {
                    let failure = CoreFailure::GenerationUnavailable(e.to_string());
                    return self.fallback(outline, &history_norm, failure, attempt);
                }
            };

            let text_norm = normalize(&text);
            if text_norm.is_empty() {
                let failure = CoreFailure::GenerationUnavailable("blank question".to_string());
                return self.fallback(outline, &history_norm, failure, attempt);
            }

            match closest_match(&text_norm, &history_norm) {
                Some(ratio) if ratio >= self.settings.similarity_threshold => {
                    let failure = CoreFailure::DuplicateQuestion {
                        ratio,
                        threshold: self.settings.similarity_threshold,
                        attempt,
                    };
                    info!(
                        kind = failure.kind(),
                        "Interview {}: {failure}; asking for a different question",
                        outline.id
                    );
                    prompt.push_str(SUBSTANTIALLY_DIFFERENT_DIRECTIVE);
                }
                _ => {
                    return GeneratedQuestion {
                        text,
                        source: QuestionSource::Generated { attempts: attempt },
                    };
                }
            }
        }

        warn!(
            "Interview {}: generator repeated itself after {} attempts; using fallback pool",
            outline.id, self.settings.max_attempts
        );
        self.pick(outline, &history_norm, FallbackReason::DuplicatesExhausted)
    }

    fn fallback(
        &self,
        outline: &InterviewOutline,
        history_norm: &[String],
        failure: CoreFailure,
        attempt: u32,
    ) -> GeneratedQuestion {
        warn!(
            kind = failure.kind(),
            "Interview {}: {failure} (attempt {attempt}); using fallback pool", outline.id
        );
        self.pick(outline, history_norm, FallbackReason::GenerationUnavailable)
    }

    fn pick(
        &self,
        outline: &InterviewOutline,
        history_norm: &[String],
        reason: FallbackReason,
    ) -> GeneratedQuestion {
        let excluded: HashSet<String> = history_norm.iter().cloned().collect();
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let pick = pick_fallback(outline, &excluded, &mut *rng);

        GeneratedQuestion {
            text: pick.text,
            source: QuestionSource::Fallback {
                topic: pick.topic,
                reason,
            },
        }
    }
}

/// Builds the generation prompt, enumerating at most `limit` recent questions.
pub fn build_question_prompt(outline: &InterviewOutline, history: &[String], limit: usize) -> String {
    let mut prompt = fill_outline(
        QUESTION_PROMPT_TEMPLATE,
        outline,
        &[("single_question_instruction", SINGLE_QUESTION_INSTRUCTION)],
    );

    let recent: Vec<&str> = history
        .iter()
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .take(limit)
        .collect();

    if !recent.is_empty() {
        prompt.push_str(AVOID_REPEAT_HEADER);
        for q in recent {
            prompt.push_str("\n- ");
            prompt.push_str(q);
        }
        prompt.push('\n');
    }

    prompt
}

/// Trims whitespace, a leading "Question:" label and wrapping quotes.
fn clean_question(raw: &str) -> String {
    let mut text = raw.trim();
    for label in ["Question:", "question:", "Q:"] {
        if let Some(rest) = text.strip_prefix(label) {
            text = rest.trim_start();
        }
    }
    text.trim_matches(|c: char| c == '"' || c == '\u{201c}' || c == '\u{201d}')
        .trim()
        .to_string()
}
