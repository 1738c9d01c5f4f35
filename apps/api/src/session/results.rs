//! Aggregate results: computed on demand from answers, optionally frozen for audit.
//!
//! Freezing renders a markdown transcript, uploads it to S3 and records an
//! `interview_results` row pointing at it.

use aws_sdk_s3::primitives::ByteStream;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::{AnswerRow, InterviewResultRow, NewResult};
use crate::models::outline::InterviewOutline;
use crate::session::store::InterviewStore;

/// Summary of a candidate's session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub interview_id: Uuid,
    pub candidate_id: Uuid,
    pub answered: i32,
    pub total_questions: i32,
    /// Mean of non-absent scores, one decimal; 0 when nothing was scored.
    pub average_score: f64,
    pub scored_answers: usize,
    pub feedback: String,
}

impl AggregateResult {
    pub fn is_complete(&self) -> bool {
        self.answered >= self.total_questions
    }
}

pub fn compute_aggregate(
    outline: &InterviewOutline,
    candidate_id: Uuid,
    answers: &[AnswerRow],
) -> AggregateResult {
    let scores: Vec<i32> = answers.iter().filter_map(|a| a.ai_score).collect();
    let average_score = if scores.is_empty() {
        0.0
    } else {
        let mean = scores.iter().sum::<i32>() as f64 / scores.len() as f64;
        (mean * 10.0).round() / 10.0
    };

    let feedback = answers
        .iter()
        .filter(|a| !a.ai_feedback.trim().is_empty())
        .map(|a| format!("Q{}: {}", a.question_number, a.ai_feedback.trim()))
        .collect::<Vec<_>>()
        .join("\n");

    AggregateResult {
        interview_id: outline.id,
        candidate_id,
        answered: answers.len() as i32,
        total_questions: outline.number_of_questions,
        average_score,
        scored_answers: scores.len(),
        feedback,
    }
}

/// Renders a completed session as a markdown document for the audit snapshot.
pub fn render_transcript_md(
    outline: &InterviewOutline,
    aggregate: &AggregateResult,
    answers: &[AnswerRow],
) -> String {
    let mut md = format!("# Interview Transcript — {}\n\n", outline.title);
    md.push_str(&format!("- **Interview:** {}\n", outline.id));
    md.push_str(&format!("- **Candidate:** {}\n", aggregate.candidate_id));
    md.push_str(&format!(
        "- **Answered:** {}/{}\n",
        aggregate.answered, aggregate.total_questions
    ));
    md.push_str(&format!(
        "- **Average score:** {:.1} ({} scored)\n\n",
        aggregate.average_score, aggregate.scored_answers
    ));

    for answer in answers {
        md.push_str(&format!("## Question {}\n\n", answer.question_number));
        md.push_str(&format!("{}\n\n", answer.question));
        md.push_str("### Answer\n\n");
        md.push_str(&format!("{}\n\n", answer.answer));
        match answer.ai_score {
            Some(score) => md.push_str(&format!("- **Score:** {score}/10\n")),
            None => md.push_str("- **Score:** not scored\n"),
        }
        if !answer.ai_feedback.trim().is_empty() {
            md.push_str(&format!("- **Feedback:** {}\n", answer.ai_feedback.trim()));
        }
        md.push('\n');
    }
    md
}

/// Freezes a completed session: transcript upload plus a persisted result row.
pub async fn freeze_result(
    store: &dyn InterviewStore,
    s3: &aws_sdk_s3::Client,
    s3_bucket: &str,
    outline: &InterviewOutline,
    candidate_id: Uuid,
) -> Result<InterviewResultRow, AppError> {
    let answers = store.list_answers(outline.id, candidate_id).await?;
    let aggregate = compute_aggregate(outline, candidate_id, &answers);

    if !aggregate.is_complete() {
        return Err(AppError::Validation(format!(
            "Interview is not complete: {}/{} questions answered",
            aggregate.answered, aggregate.total_questions
        )));
    }

    let md = render_transcript_md(outline, &aggregate, &answers);
    let s3_key = format!(
        "results/{}/{}/{}.md",
        outline.id,
        candidate_id,
        Uuid::new_v4()
    );
    s3.put_object()
        .bucket(s3_bucket)
        .key(&s3_key)
        .body(ByteStream::from(md.into_bytes()))
        .content_type("text/markdown")
        .send()
        .await
        .map_err(|e| AppError::S3(format!("transcript upload failed: {e}")))?;

    info!("Uploaded interview transcript to s3://{}/{}", s3_bucket, s3_key);

    let raw_payload = serde_json::to_value(&aggregate)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize aggregate: {e}")))?;

    let row = store
        .save_result(&NewResult {
            interview_id: outline.id,
            candidate_id,
            overall_score: Some(aggregate.average_score.round() as i32),
            overall_feedback: aggregate.feedback.clone(),
            raw_payload: Some(raw_payload),
            transcript_key: Some(s3_key),
        })
        .await?;

    info!(
        "Froze result {} for candidate {} on interview {} (average {:.1})",
        row.id, candidate_id, outline.id, aggregate.average_score
    );
    Ok(row)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;

    use crate::interview::fallback::tests::outline;

    pub(crate) fn answer(
        outline: &InterviewOutline,
        candidate_id: Uuid,
        n: i32,
        score: Option<i32>,
        feedback: &str,
    ) -> AnswerRow {
        AnswerRow {
            id: Uuid::new_v4(),
            interview_id: outline.id,
            candidate_id,
            question_number: n,
            question: format!("Question {n}?"),
            answer: format!("Answer {n}."),
            ai_score: score,
            ai_feedback: feedback.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_average_skips_absent_scores() {
        let o = outline("Backend Engineer", "Django");
        let c = Uuid::new_v4();
        let answers = vec![
            answer(&o, c, 1, Some(7), "Solid"),
            answer(&o, c, 2, None, "I think it's fine"),
            answer(&o, c, 3, Some(8), "Great"),
        ];

        let agg = compute_aggregate(&o, c, &answers);

        assert_eq!(agg.average_score, 7.5);
        assert_eq!(agg.scored_answers, 2);
        assert_eq!(agg.answered, 3);
        assert!(agg.is_complete());
        assert_eq!(agg.feedback, "Q1: Solid\nQ2: I think it's fine\nQ3: Great");
    }

    #[test]
    fn test_average_is_zero_without_scores() {
        let o = outline("Backend Engineer", "Django");
        let c = Uuid::new_v4();
        let agg = compute_aggregate(&o, c, &[answer(&o, c, 1, None, "")]);
        assert_eq!(agg.average_score, 0.0);
        assert!(agg.feedback.is_empty());
        assert!(!agg.is_complete());
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        let o = outline("Backend Engineer", "Django");
        let c = Uuid::new_v4();
        let answers = vec![
            answer(&o, c, 1, Some(7), ""),
            answer(&o, c, 2, Some(7), ""),
            answer(&o, c, 3, Some(8), ""),
        ];
        assert_eq!(compute_aggregate(&o, c, &answers).average_score, 7.3);
    }

    #[test]
    fn test_transcript_lists_every_answer() {
        let o = outline("Backend Engineer", "Django");
        let c = Uuid::new_v4();
        let answers = vec![
            answer(&o, c, 1, Some(9), "Precise"),
            answer(&o, c, 2, None, ""),
        ];
        let agg = compute_aggregate(&o, c, &answers);

        let md = render_transcript_md(&o, &agg, &answers);

        assert!(md.starts_with("# Interview Transcript — Backend Engineer"));
        assert!(md.contains("## Question 1"));
        assert!(md.contains("- **Score:** 9/10"));
        assert!(md.contains("- **Feedback:** Precise"));
        assert!(md.contains("## Question 2"));
        assert!(md.contains("- **Score:** not scored"));
    }
}
