//! Persistence collaborator for outlines, asked questions, answers and results.
//!
//! `PgInterviewStore` is the production backend. The tracker only sees the
//! `InterviewStore` trait, carried as `Arc<dyn InterviewStore>`.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::interview::{
    AnswerRow, InterviewResultRow, NewAnswer, NewAskedQuestion, NewResult,
};
use crate::models::outline::{InterviewOutline, NewOutline};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// A uniqueness rule was violated, e.g. a question_number recorded twice.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

#[async_trait]
pub trait InterviewStore: Send + Sync {
    async fn create_outline(&self, outline: &NewOutline) -> Result<InterviewOutline, StoreError>;

    async fn get_outline(&self, id: Uuid) -> Result<Option<InterviewOutline>, StoreError>;

    async fn count_answers(&self, interview_id: Uuid, candidate_id: Uuid)
        -> Result<i64, StoreError>;

    /// All answers for the pair, ordered by question_number ascending.
    async fn list_answers(
        &self,
        interview_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Vec<AnswerRow>, StoreError>;

    /// Texts of shown-but-unanswered questions, most recent first.
    async fn recent_unanswered_questions(
        &self,
        interview_id: Uuid,
        candidate_id: Uuid,
        limit: usize,
    ) -> Result<Vec<String>, StoreError>;

    /// Appends an asked question unless an identical unanswered row already exists.
    /// Returns whether a row was inserted.
    async fn record_asked_question(&self, question: &NewAskedQuestion) -> Result<bool, StoreError>;

    /// Inserts a new answer and marks matching unanswered asked questions answered.
    /// A duplicate question_number is reported as `StoreError::Conflict`.
    async fn record_answer(&self, answer: &NewAnswer) -> Result<AnswerRow, StoreError>;

    /// Inserts or overwrites the answer at `question_number`. An empty answer text
    /// keeps the stored one.
    async fn upsert_answer(&self, answer: &NewAnswer) -> Result<AnswerRow, StoreError>;

    async fn save_result(&self, result: &NewResult) -> Result<InterviewResultRow, StoreError>;

    async fn latest_result(
        &self,
        interview_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<InterviewResultRow>, StoreError>;
}

pub struct PgInterviewStore {
    pool: PgPool,
}

impl PgInterviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn conflict_on_unique(err: sqlx::Error, what: impl FnOnce() -> String) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(what()),
        _ => StoreError::from(err),
    }
}

const MARK_ANSWERED_SQL: &str = r#"
    UPDATE asked_questions
    SET answered = TRUE
    WHERE interview_id = $1 AND candidate_id = $2 AND question_text = $3 AND answered = FALSE
"#;

#[async_trait]
impl InterviewStore for PgInterviewStore {
    async fn create_outline(&self, outline: &NewOutline) -> Result<InterviewOutline, StoreError> {
        Ok(sqlx::query_as::<_, InterviewOutline>(
            r#"
            INSERT INTO interviews
                (title, description, required_skills, responsibilities,
                 evaluation_criteria, number_of_questions, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(outline.title.trim())
        .bind(&outline.description)
        .bind(&outline.required_skills)
        .bind(&outline.responsibilities)
        .bind(&outline.evaluation_criteria)
        .bind(outline.number_of_questions)
        .bind(outline.created_by)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_outline(&self, id: Uuid) -> Result<Option<InterviewOutline>, StoreError> {
        Ok(
            sqlx::query_as::<_, InterviewOutline>("SELECT * FROM interviews WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn count_answers(
        &self,
        interview_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<i64, StoreError> {
        Ok(sqlx::query_scalar(
            "SELECT COUNT(*) FROM interview_answers WHERE interview_id = $1 AND candidate_id = $2",
        )
        .bind(interview_id)
        .bind(candidate_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_answers(
        &self,
        interview_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Vec<AnswerRow>, StoreError> {
        Ok(sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT * FROM interview_answers
            WHERE interview_id = $1 AND candidate_id = $2
            ORDER BY question_number ASC
            "#,
        )
        .bind(interview_id)
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn recent_unanswered_questions(
        &self,
        interview_id: Uuid,
        candidate_id: Uuid,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        Ok(sqlx::query_scalar(
            r#"
            SELECT question_text FROM asked_questions
            WHERE interview_id = $1 AND candidate_id = $2 AND answered = FALSE
            ORDER BY displayed_at DESC
            LIMIT $3
            "#,
        )
        .bind(interview_id)
        .bind(candidate_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn record_asked_question(&self, question: &NewAskedQuestion) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO asked_questions (interview_id, candidate_id, question_text, source)
            SELECT $1::uuid, $2::uuid, $3::text, $4::text
            WHERE NOT EXISTS (
                SELECT 1 FROM asked_questions
                WHERE interview_id = $1 AND candidate_id = $2
                  AND question_text = $3 AND answered = FALSE
            )
            "#,
        )
        .bind(question.interview_id)
        .bind(question.candidate_id)
        .bind(&question.question_text)
        .bind(&question.source)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_answer(&self, answer: &NewAnswer) -> Result<AnswerRow, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, AnswerRow>(
            r#"
            INSERT INTO interview_answers
                (interview_id, candidate_id, question_number, question, answer, ai_score, ai_feedback)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(answer.interview_id)
        .bind(answer.candidate_id)
        .bind(answer.question_number)
        .bind(&answer.question)
        .bind(&answer.answer)
        .bind(answer.ai_score)
        .bind(&answer.ai_feedback)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!("question {} is already recorded", answer.question_number)
            })
        })?;

        sqlx::query(MARK_ANSWERED_SQL)
            .bind(answer.interview_id)
            .bind(answer.candidate_id)
            .bind(&answer.question)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn upsert_answer(&self, answer: &NewAnswer) -> Result<AnswerRow, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, AnswerRow>(
            r#"
            INSERT INTO interview_answers
                (interview_id, candidate_id, question_number, question, answer, ai_score, ai_feedback)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (interview_id, candidate_id, question_number) DO UPDATE SET
                question = EXCLUDED.question,
                answer = COALESCE(NULLIF(EXCLUDED.answer, ''), interview_answers.answer),
                ai_score = EXCLUDED.ai_score,
                ai_feedback = EXCLUDED.ai_feedback
            RETURNING *
            "#,
        )
        .bind(answer.interview_id)
        .bind(answer.candidate_id)
        .bind(answer.question_number)
        .bind(&answer.question)
        .bind(&answer.answer)
        .bind(answer.ai_score)
        .bind(&answer.ai_feedback)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(MARK_ANSWERED_SQL)
            .bind(answer.interview_id)
            .bind(answer.candidate_id)
            .bind(&answer.question)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn save_result(&self, result: &NewResult) -> Result<InterviewResultRow, StoreError> {
        Ok(sqlx::query_as::<_, InterviewResultRow>(
            r#"
            INSERT INTO interview_results
                (interview_id, candidate_id, overall_score, overall_feedback, raw_payload, transcript_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(result.interview_id)
        .bind(result.candidate_id)
        .bind(result.overall_score)
        .bind(&result.overall_feedback)
        .bind(&result.raw_payload)
        .bind(&result.transcript_key)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn latest_result(
        &self,
        interview_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<InterviewResultRow>, StoreError> {
        Ok(sqlx::query_as::<_, InterviewResultRow>(
            r#"
            SELECT * FROM interview_results
            WHERE interview_id = $1 AND candidate_id = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(interview_id)
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
