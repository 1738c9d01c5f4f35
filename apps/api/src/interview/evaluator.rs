//! Answer evaluator: scores a candidate answer through the text capability.
//!
//! The capability is asked for `Score: <int>\nFeedback: <text>`. Malformed replies
//! keep the raw text as feedback with no score; an unavailable capability yields a
//! neutral score so a submission is never blocked.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use crate::errors::CoreFailure;
use crate::interview::prompts::{fill_template, EVALUATION_PROMPT_TEMPLATE};
use crate::llm_client::{generate_within, TextGenerator};

pub const NEUTRAL_SCORE: i32 = 5;
pub const NEUTRAL_FEEDBACK: &str = "Answer recorded successfully.";
pub const MAX_SCORE: i32 = 10;

const SCORE_MARKER: &str = "Score:";
const FEEDBACK_MARKER: &str = "Feedback:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationOutcome {
    Scored,
    Malformed,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub score: Option<i32>,
    pub feedback: String,
    pub outcome: EvaluationOutcome,
}

impl Evaluation {
    fn neutral() -> Self {
        Self {
            score: Some(NEUTRAL_SCORE),
            feedback: NEUTRAL_FEEDBACK.to_string(),
            outcome: EvaluationOutcome::Unavailable,
        }
    }
}

pub struct AnswerEvaluator {
    llm: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl AnswerEvaluator {
    pub fn new(llm: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Scores `answer` against `question`. Never fails.
    pub async fn evaluate(&self, question: &str, answer: &str) -> Evaluation {
        let prompt = fill_template(
            EVALUATION_PROMPT_TEMPLATE,
            &[("question", question), ("answer", answer)],
        );

        let raw = match generate_within(self.llm.as_ref(), &prompt, self.timeout).await {
            Ok(raw) => raw,
            Err(e) => {
                let failure = CoreFailure::EvaluationUnavailable(e.to_string());
                warn!(kind = failure.kind(), "{failure}; substituting neutral score");
                return Evaluation::neutral();
            }
        };

        match parse_evaluation(&raw) {
            Some((score, feedback)) => Evaluation {
                score: Some(score),
                feedback,
                outcome: EvaluationOutcome::Scored,
            },
            None => {
                let failure = CoreFailure::MalformedEvaluation;
                warn!(
                    kind = failure.kind(),
                    "{failure}; keeping raw text ({} chars) as feedback",
                    raw.len()
                );
                Evaluation {
                    score: None,
                    feedback: raw.trim().to_string(),
                    outcome: EvaluationOutcome::Malformed,
                }
            }
        }
    }
}

/// Parses `Score: N` and `Feedback: text` out of an evaluator reply.
///
/// The score is the integer between the marker and the next newline; an optional
/// `/10` suffix is tolerated. Returns `None` when either marker is missing or the
/// score is not an integer in 0..=10.
pub fn parse_evaluation(raw: &str) -> Option<(i32, String)> {
    let (_, after_score) = raw.split_once(SCORE_MARKER)?;
    let score_text = after_score.lines().next().unwrap_or_default().trim();
    let score_text = score_text.strip_suffix("/10").unwrap_or(score_text).trim();
    let score: i32 = score_text.parse().ok()?;
    if !(0..=MAX_SCORE).contains(&score) {
        return None;
    }

    let (_, feedback) = raw.split_once(FEEDBACK_MARKER)?;
    Some((score, feedback.trim().to_string()))
}
