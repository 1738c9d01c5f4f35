//! Results callback: ingests batch results computed by an external evaluator.
//!
//! Requests carry a shared secret in `X-Callback-Token`. Answers are written
//! through by question_number and a result row keeps the raw payload for audit.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::evaluator::MAX_SCORE;
use crate::models::interview::{AnswerRow, InterviewResultRow, NewAnswer, NewResult};
use crate::models::outline::InterviewOutline;
use crate::session::results::compute_aggregate;
use crate::session::store::InterviewStore;

pub const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackAnswer {
    pub question_number: i32,
    pub question: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub score: Option<i32>,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsCallback {
    pub interview_id: Uuid,
    pub candidate_id: Uuid,
    #[serde(default)]
    pub overall_score: Option<i32>,
    #[serde(default)]
    pub overall_feedback: Option<String>,
    #[serde(default)]
    pub answers: Vec<CallbackAnswer>,
}

/// Checks the presented token against the configured one. An unset secret
/// rejects every request.
pub fn authorize(expected: Option<&str>, presented: Option<&str>) -> Result<(), AppError> {
    match (expected, presented) {
        (Some(expected), Some(presented))
            if !expected.is_empty() && constant_time_eq(expected.as_bytes(), presented.as_bytes()) =>
        {
            Ok(())
        }
        _ => Err(AppError::Unauthorized),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn score_in_range(score: Option<i32>) -> bool {
    score.map_or(true, |s| (0..=MAX_SCORE).contains(&s))
}

/// Validates a payload against the outline it targets and the answers already
/// stored for the pair. Stored and delivered question numbers together must
/// form `1..=k`, so live submissions can continue at `k + 1`.
pub fn validate(
    outline: &InterviewOutline,
    payload: &ResultsCallback,
    existing: &[AnswerRow],
) -> Result<(), AppError> {
    if !score_in_range(payload.overall_score) {
        return Err(AppError::Validation(format!(
            "overall_score must be between 0 and {MAX_SCORE}"
        )));
    }

    for answer in &payload.answers {
        if !(1..=outline.number_of_questions).contains(&answer.question_number) {
            return Err(AppError::Validation(format!(
                "question_number {} is outside 1..={}",
                answer.question_number, outline.number_of_questions
            )));
        }
        if answer.question.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "question {} has no text",
                answer.question_number
            )));
        }
        if !score_in_range(answer.score) {
            return Err(AppError::Validation(format!(
                "score for question {} must be between 0 and {MAX_SCORE}",
                answer.question_number
            )));
        }
    }

    let numbers: BTreeSet<i32> = existing
        .iter()
        .map(|a| a.question_number)
        .chain(payload.answers.iter().map(|a| a.question_number))
        .collect();
    if let Some(missing) = (1..).zip(&numbers).find(|(expected, n)| expected != *n) {
        return Err(AppError::Validation(format!(
            "question_number {} is missing; answers must run from 1 without gaps",
            missing.0
        )));
    }
    Ok(())
}

/// Writes the payload through to answers and a result row.
/// Callers serialize this with other writes for the same (interview, candidate).
pub async fn apply_callback(
    store: &dyn InterviewStore,
    outline: &InterviewOutline,
    payload: &ResultsCallback,
) -> Result<InterviewResultRow, AppError> {
    let existing = store.list_answers(outline.id, payload.candidate_id).await?;
    validate(outline, payload, &existing)?;

    for answer in &payload.answers {
        store
            .upsert_answer(&NewAnswer {
                interview_id: outline.id,
                candidate_id: payload.candidate_id,
                question_number: answer.question_number,
                question: answer.question.trim().to_string(),
                answer: answer.answer.clone().unwrap_or_default(),
                ai_score: answer.score,
                ai_feedback: answer.feedback.clone().unwrap_or_default(),
            })
            .await?;
    }

    let answers = store.list_answers(outline.id, payload.candidate_id).await?;
    let aggregate = compute_aggregate(outline, payload.candidate_id, &answers);

    let overall_score = payload
        .overall_score
        .or_else(|| (aggregate.scored_answers > 0).then(|| aggregate.average_score.round() as i32));
    let overall_feedback = payload
        .overall_feedback
        .clone()
        .unwrap_or_else(|| aggregate.feedback.clone());

    let raw_payload = serde_json::to_value(payload)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize callback: {e}")))?;

    let row = store
        .save_result(&NewResult {
            interview_id: outline.id,
            candidate_id: payload.candidate_id,
            overall_score,
            overall_feedback,
            raw_payload: Some(raw_payload),
            transcript_key: None,
        })
        .await?;

    info!(
        "Ingested callback result {} ({} answers) for candidate {} on interview {}",
        row.id,
        payload.answers.len(),
        payload.candidate_id,
        outline.id
    );
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::fallback::tests::outline;
    use crate::session::memory_store::MemoryStore;
    use crate::session::results::tests::answer;

    fn payload(o: &InterviewOutline, candidate_id: Uuid, answers: Vec<CallbackAnswer>) -> ResultsCallback {
        ResultsCallback {
            interview_id: o.id,
            candidate_id,
            overall_score: None,
            overall_feedback: None,
            answers,
        }
    }

    fn cb_answer(n: i32, score: Option<i32>) -> CallbackAnswer {
        CallbackAnswer {
            question_number: n,
            question: format!("Question {n}?"),
            answer: Some(format!("Answer {n}")),
            score,
            feedback: Some(format!("Feedback {n}")),
        }
    }

    #[test]
    fn test_authorize_requires_matching_configured_token() {
        assert!(authorize(Some("s3cret"), Some("s3cret")).is_ok());
        assert!(authorize(Some("s3cret"), Some("s3cre7")).is_err());
        assert!(authorize(Some("s3cret"), Some("s3cret-longer")).is_err());
        assert!(authorize(Some("s3cret"), None).is_err());
        assert!(authorize(None, Some("anything")).is_err());
        assert!(authorize(Some(""), Some("")).is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_numbers_and_scores() {
        let o = outline("Backend Engineer", "Django"); // 3 questions
        let c = Uuid::new_v4();

        assert!(validate(&o, &payload(&o, c, vec![cb_answer(4, Some(5))]), &[]).is_err());
        assert!(validate(&o, &payload(&o, c, vec![cb_answer(0, Some(5))]), &[]).is_err());
        assert!(validate(&o, &payload(&o, c, vec![cb_answer(1, Some(11))]), &[]).is_err());

        let full = vec![cb_answer(1, None), cb_answer(2, Some(4)), cb_answer(3, None)];
        assert!(validate(&o, &payload(&o, c, full), &[]).is_ok());

        let mut p = payload(&o, c, vec![]);
        p.overall_score = Some(-1);
        assert!(validate(&o, &p, &[]).is_err());
    }

    #[test]
    fn test_validate_rejects_gaps_in_question_numbers() {
        let o = outline("Backend Engineer", "Django");
        let c = Uuid::new_v4();

        let err = validate(&o, &payload(&o, c, vec![cb_answer(2, Some(5))]), &[]).unwrap_err();
        assert!(err.to_string().contains("question_number 1 is missing"));

        let gap = vec![cb_answer(1, Some(5)), cb_answer(3, Some(5))];
        assert!(validate(&o, &payload(&o, c, gap), &[]).is_err());
    }

    #[test]
    fn test_validate_counts_stored_answers_toward_contiguity() {
        let o = outline("Backend Engineer", "Django");
        let c = Uuid::new_v4();
        let stored = vec![answer(&o, c, 1, Some(6), "")];

        assert!(validate(&o, &payload(&o, c, vec![cb_answer(2, Some(5))]), &stored).is_ok());
        assert!(validate(&o, &payload(&o, c, vec![cb_answer(3, Some(5))]), &stored).is_err());
        // Overwriting a stored question keeps the sequence intact.
        assert!(validate(&o, &payload(&o, c, vec![cb_answer(1, Some(9))]), &stored).is_ok());
    }

    #[tokio::test]
    async fn test_apply_rejects_gap_without_writing() {
        let store = MemoryStore::default();
        let o = outline("Backend Engineer", "Django");
        store.insert_outline(o.clone());
        let c = Uuid::new_v4();

        let result = apply_callback(&store, &o, &payload(&o, c, vec![cb_answer(2, Some(5))])).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(store.count_answers(o.id, c).await.unwrap(), 0);
        assert!(store.results().is_empty());
    }

    #[tokio::test]
    async fn test_apply_writes_answers_and_result() {
        let store = MemoryStore::default();
        let o = outline("Backend Engineer", "Django");
        store.insert_outline(o.clone());
        let c = Uuid::new_v4();

        let p = payload(&o, c, vec![cb_answer(1, Some(6)), cb_answer(2, Some(9))]);
        let row = apply_callback(&store, &o, &p).await.unwrap();

        assert_eq!(store.count_answers(o.id, c).await.unwrap(), 2);
        assert_eq!(row.overall_score, Some(8)); // 7.5 rounds away from zero
        assert_eq!(row.overall_feedback, "Q1: Feedback 1\nQ2: Feedback 2");
        assert!(row.raw_payload.is_some());
    }

    #[tokio::test]
    async fn test_apply_overwrites_existing_question_and_prefers_given_overall() {
        let store = MemoryStore::default();
        let o = outline("Backend Engineer", "Django");
        store.insert_outline(o.clone());
        let c = Uuid::new_v4();

        apply_callback(&store, &o, &payload(&o, c, vec![cb_answer(1, Some(2))]))
            .await
            .unwrap();

        let mut second = payload(&o, c, vec![cb_answer(1, Some(9))]);
        second.overall_score = Some(10);
        second.overall_feedback = Some("Excellent overall".to_string());
        let row = apply_callback(&store, &o, &second).await.unwrap();

        let answers = store.list_answers(o.id, c).await.unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].ai_score, Some(9));
        assert_eq!(row.overall_score, Some(10));
        assert_eq!(row.overall_feedback, "Excellent overall");
        assert_eq!(store.results().len(), 2);
    }
}
