use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One scored answer. `question_number` runs 1..=N per (interview, candidate).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnswerRow {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub candidate_id: Uuid,
    pub question_number: i32,
    pub question: String,
    pub answer: String,
    pub ai_score: Option<i32>,
    pub ai_feedback: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only log of questions shown to a candidate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AskedQuestionRow {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub candidate_id: Uuid,
    pub question_text: String,
    /// Provenance tag: `generated` or `fallback:<topic>:<reason>`.
    pub source: String,
    pub displayed_at: DateTime<Utc>,
    pub answered: bool,
}

/// Frozen aggregate for audit, or a result delivered through the callback.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewResultRow {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub candidate_id: Uuid,
    pub overall_score: Option<i32>,
    pub overall_feedback: String,
    pub raw_payload: Option<Value>,
    pub transcript_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub interview_id: Uuid,
    pub candidate_id: Uuid,
    pub question_number: i32,
    pub question: String,
    pub answer: String,
    pub ai_score: Option<i32>,
    pub ai_feedback: String,
}

#[derive(Debug, Clone)]
pub struct NewAskedQuestion {
    pub interview_id: Uuid,
    pub candidate_id: Uuid,
    pub question_text: String,
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct NewResult {
    pub interview_id: Uuid,
    pub candidate_id: Uuid,
    pub overall_score: Option<i32>,
    pub overall_feedback: String,
    pub raw_payload: Option<Value>,
    pub transcript_key: Option<String>,
}
