//! Session progress per (interview, candidate).
//!
//! A session is IN_PROGRESS while fewer than `number_of_questions` answers exist
//! and COMPLETE afterwards. COMPLETE is terminal: no further questions are
//! generated and only the aggregate is reported.
//!
//! Every operation on a pair runs under that pair's async mutex, which also owns
//! the in-memory list of questions shown but not yet answered. The list keeps
//! immediate repeats out even when the asked-question write fails.
//!
//! Slots are dropped once the session completes or sits idle past the TTL, and
//! the map is capped at `max_tracked_sessions`. A slot is only dropped while no
//! request holds it, so two requests for one pair always share a mutex.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{AppError, CoreFailure};
use crate::interview::evaluator::{AnswerEvaluator, EvaluationOutcome};
use crate::interview::generator::{QuestionGenerator, QuestionSource};
use crate::interview::similarity::normalize;
use crate::models::interview::{AnswerRow, InterviewResultRow, NewAnswer, NewAskedQuestion};
use crate::models::outline::InterviewOutline;
use crate::session::ingest::{apply_callback, ResultsCallback};
use crate::session::results::{compute_aggregate, freeze_result, AggregateResult};
use crate::session::store::InterviewStore;

type SessionKey = (Uuid, Uuid);
type Slot = Arc<Mutex<ShownQuestions>>;

struct TrackedSession {
    slot: Slot,
    last_used: Instant,
}

/// Only the map holds the slot: no request is using or waiting on it.
fn is_idle(session: &TrackedSession) -> bool {
    Arc::strong_count(&session.slot) == 1
}

/// Questions shown to the candidate and not answered yet, most recent first.
#[derive(Default)]
struct ShownQuestions {
    recent: VecDeque<String>,
}

impl ShownQuestions {
    fn remember(&mut self, question: &str, limit: usize) {
        self.recent.push_front(question.to_string());
        self.recent.truncate(limit);
    }

    fn forget(&mut self, question: &str) {
        let target = normalize(question);
        self.recent.retain(|q| normalize(q) != target);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionPayload {
    pub question: String,
    pub question_number: i32,
    pub total_questions: i32,
    pub progress_percent: u32,
    pub source: QuestionSource,
}

/// What the caller should show next.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionStep {
    InProgress(QuestionPayload),
    Complete(AggregateResult),
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordedAnswer {
    pub question_number: i32,
    pub score: Option<i32>,
    pub feedback: String,
    pub evaluation: EvaluationOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub recorded: RecordedAnswer,
    pub next: SessionStep,
}

pub struct SessionTracker {
    store: Arc<dyn InterviewStore>,
    generator: QuestionGenerator,
    evaluator: AnswerEvaluator,
    sessions: Mutex<HashMap<SessionKey, TrackedSession>>,
}

impl SessionTracker {
    pub fn new(
        store: Arc<dyn InterviewStore>,
        generator: QuestionGenerator,
        evaluator: AnswerEvaluator,
    ) -> Self {
        Self {
            store,
            generator,
            evaluator,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the pair's slot, creating it if needed. Expired idle slots are
    /// pruned first; at capacity the least recently used idle slot goes.
    async fn slot(&self, key: SessionKey) -> Slot {
        let settings = self.generator.settings();
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;

        sessions.retain(|k, s| {
            *k == key || !is_idle(s) || now.duration_since(s.last_used) < settings.session_idle_ttl
        });

        if !sessions.contains_key(&key) && sessions.len() >= settings.max_tracked_sessions {
            let oldest = sessions
                .iter()
                .filter(|(_, s)| is_idle(s))
                .min_by_key(|(_, s)| s.last_used)
                .map(|(k, _)| *k);
            match oldest {
                Some(oldest) => {
                    sessions.remove(&oldest);
                }
                None => warn!(
                    "All {} tracked sessions are busy; tracking one more",
                    sessions.len()
                ),
            }
        }

        let session = sessions.entry(key).or_insert_with(|| TrackedSession {
            slot: Slot::default(),
            last_used: now,
        });
        session.last_used = now;
        session.slot.clone()
    }

    /// Drops the pair's slot unless another request still holds it.
    async fn release(&self, key: SessionKey, slot: Slot) {
        let mut sessions = self.sessions.lock().await;
        drop(slot);
        if sessions.get(&key).map_or(false, is_idle) {
            sessions.remove(&key);
        }
    }

    async fn outline(&self, interview_id: Uuid) -> Result<InterviewOutline, AppError> {
        self.store
            .get_outline(interview_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Interview {interview_id} not found")))
    }

    /// Display request: returns the next question, or the summary once complete.
    pub async fn next_step(
        &self,
        interview_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<SessionStep, AppError> {
        let outline = self.outline(interview_id).await?;
        let key = (interview_id, candidate_id);
        let slot = self.slot(key).await;
        let mut shown = slot.lock().await;

        let answers = self.store.list_answers(interview_id, candidate_id).await?;
        if answers.len() as i32 >= outline.number_of_questions {
            drop(shown);
            self.release(key, slot).await;
            return Ok(SessionStep::Complete(compute_aggregate(
                &outline,
                candidate_id,
                &answers,
            )));
        }

        let step = self
            .ask_next(&outline, candidate_id, &answers, &mut shown)
            .await;
        Ok(SessionStep::InProgress(step))
    }

    /// Answer submission: scores the answer, records it, and returns the next step.
    pub async fn submit_answer(
        &self,
        interview_id: Uuid,
        candidate_id: Uuid,
        question: &str,
        answer: &str,
    ) -> Result<SubmitOutcome, AppError> {
        let outline = self.outline(interview_id).await?;
        let key = (interview_id, candidate_id);
        let slot = self.slot(key).await;
        let mut shown = slot.lock().await;

        let answered = self.store.count_answers(interview_id, candidate_id).await?;
        if answered >= outline.number_of_questions as i64 {
            return Err(AppError::Conflict(format!(
                "Interview {interview_id} is already complete for candidate {candidate_id}"
            )));
        }

        let evaluation = self.evaluator.evaluate(question, answer).await;
        let question_number = answered as i32 + 1;

        let row = self
            .store
            .record_answer(&NewAnswer {
                interview_id,
                candidate_id,
                question_number,
                question: question.to_string(),
                answer: answer.to_string(),
                ai_score: evaluation.score,
                ai_feedback: evaluation.feedback.clone(),
            })
            .await?;
        shown.forget(question);

        info!(
            "Recorded answer {}/{} for candidate {} on interview {} (score {:?})",
            row.question_number, outline.number_of_questions, candidate_id, interview_id, row.ai_score
        );

        let recorded = RecordedAnswer {
            question_number: row.question_number,
            score: row.ai_score,
            feedback: row.ai_feedback,
            evaluation: evaluation.outcome,
        };

        let answers = self.store.list_answers(interview_id, candidate_id).await?;
        let next = if answers.len() as i32 >= outline.number_of_questions {
            drop(shown);
            self.release(key, slot).await;
            SessionStep::Complete(compute_aggregate(&outline, candidate_id, &answers))
        } else {
            SessionStep::InProgress(
                self.ask_next(&outline, candidate_id, &answers, &mut shown)
                    .await,
            )
        };

        Ok(SubmitOutcome { recorded, next })
    }

    /// Applies an externally computed result under the pair's lock.
    pub async fn ingest_results(
        &self,
        payload: &ResultsCallback,
    ) -> Result<InterviewResultRow, AppError> {
        let outline = self.outline(payload.interview_id).await?;
        let slot = self.slot((payload.interview_id, payload.candidate_id)).await;
        let mut shown = slot.lock().await;

        let row = apply_callback(self.store.as_ref(), &outline, payload).await?;
        for answer in &payload.answers {
            shown.forget(&answer.question);
        }
        Ok(row)
    }

    /// Freezes a completed session's result under the pair's lock.
    pub async fn freeze(
        &self,
        s3: &aws_sdk_s3::Client,
        s3_bucket: &str,
        interview_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<InterviewResultRow, AppError> {
        let outline = self.outline(interview_id).await?;
        let slot = self.slot((interview_id, candidate_id)).await;
        let _shown = slot.lock().await;

        freeze_result(self.store.as_ref(), s3, s3_bucket, &outline, candidate_id).await
    }

    #[cfg(test)]
    async fn tracked_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Generates, records and remembers the next question. Caller holds the pair lock.
    async fn ask_next(
        &self,
        outline: &InterviewOutline,
        candidate_id: Uuid,
        answers: &[AnswerRow],
        shown: &mut ShownQuestions,
    ) -> QuestionPayload {
        let settings = self.generator.settings();

        let pending = match self
            .store
            .recent_unanswered_questions(outline.id, candidate_id, settings.shown_limit)
            .await
        {
            Ok(pending) => pending,
            Err(e) => {
                let failure = CoreFailure::StorageUnavailable(e.to_string());
                warn!(
                    kind = failure.kind(),
                    "Interview {} candidate {}: {failure}; using in-memory history only",
                    outline.id,
                    candidate_id
                );
                Vec::new()
            }
        };

        let answered: Vec<String> = answers
            .iter()
            .rev()
            .take(settings.history_limit)
            .map(|a| a.question.clone())
            .collect();

        let history = merge_history(&[
            shown.recent.iter().cloned().collect(),
            pending,
            answered,
        ]);

        let generated = self.generator.next_question(outline, &history).await;

        let record = NewAskedQuestion {
            interview_id: outline.id,
            candidate_id,
            question_text: generated.text.clone(),
            source: generated.source.tag(),
        };
        if let Err(e) = self.store.record_asked_question(&record).await {
            let failure = CoreFailure::StorageUnavailable(e.to_string());
            warn!(
                kind = failure.kind(),
                "Interview {} candidate {}: {failure}; question kept in memory only",
                outline.id,
                candidate_id
            );
        }
        shown.remember(&generated.text, settings.shown_limit);

        let answered_count = answers.len() as i32;
        QuestionPayload {
            question: generated.text,
            question_number: answered_count + 1,
            total_questions: outline.number_of_questions,
            progress_percent: progress_percent(answered_count, outline.number_of_questions),
            source: generated.source,
        }
    }
}

/// Concatenates history sources in priority order (each most recent first),
/// dropping blanks and normalized duplicates.
fn merge_history(sources: &[Vec<String>]) -> Vec<String> {
    let mut seen = HashSet::new();
    sources
        .iter()
        .flatten()
        .filter(|q| {
            let key = normalize(q);
            !key.is_empty() && seen.insert(key)
        })
        .cloned()
        .collect()
}

fn progress_percent(answered: i32, total: i32) -> u32 {
    if total <= 0 {
        return 100;
    }
    ((answered.max(0) as i64 * 100) / total as i64).min(100) as u32
}
