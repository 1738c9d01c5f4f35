//! In-memory `InterviewStore` for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::interview::{
    AnswerRow, AskedQuestionRow, InterviewResultRow, NewAnswer, NewAskedQuestion, NewResult,
};
use crate::models::outline::{InterviewOutline, NewOutline};
use crate::session::store::{InterviewStore, StoreError};

#[derive(Default)]
struct Tables {
    outlines: HashMap<Uuid, InterviewOutline>,
    answers: Vec<AnswerRow>,
    asked: Vec<AskedQuestionRow>,
    results: Vec<InterviewResultRow>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_asked_writes: AtomicBool,
    asked_write_attempts: AtomicUsize,
}

impl MemoryStore {
    pub fn insert_outline(&self, outline: InterviewOutline) {
        self.tables
            .lock()
            .unwrap()
            .outlines
            .insert(outline.id, outline);
    }

    /// Makes every `record_asked_question` call fail.
    pub fn fail_asked_writes(&self) {
        self.fail_asked_writes.store(true, Ordering::SeqCst);
    }

    pub fn asked_write_attempts(&self) -> usize {
        self.asked_write_attempts.load(Ordering::SeqCst)
    }

    pub fn asked(&self) -> Vec<AskedQuestionRow> {
        self.tables.lock().unwrap().asked.clone()
    }

    pub fn results(&self) -> Vec<InterviewResultRow> {
        self.tables.lock().unwrap().results.clone()
    }

    fn mark_answered(tables: &mut Tables, answer: &NewAnswer) {
        for row in tables.asked.iter_mut().filter(|r| {
            r.interview_id == answer.interview_id
                && r.candidate_id == answer.candidate_id
                && r.question_text == answer.question
        }) {
            row.answered = true;
        }
    }
}

fn answer_row(answer: &NewAnswer) -> AnswerRow {
    AnswerRow {
        id: Uuid::new_v4(),
        interview_id: answer.interview_id,
        candidate_id: answer.candidate_id,
        question_number: answer.question_number,
        question: answer.question.clone(),
        answer: answer.answer.clone(),
        ai_score: answer.ai_score,
        ai_feedback: answer.ai_feedback.clone(),
        created_at: Utc::now(),
    }
}

fn same_pair(row: &AnswerRow, interview_id: Uuid, candidate_id: Uuid) -> bool {
    row.interview_id == interview_id && row.candidate_id == candidate_id
}

#[async_trait]
impl InterviewStore for MemoryStore {
    async fn create_outline(&self, outline: &NewOutline) -> Result<InterviewOutline, StoreError> {
        let row = InterviewOutline {
            id: Uuid::new_v4(),
            title: outline.title.trim().to_string(),
            description: outline.description.clone(),
            required_skills: outline.required_skills.clone(),
            responsibilities: outline.responsibilities.clone(),
            evaluation_criteria: outline.evaluation_criteria.clone(),
            number_of_questions: outline.number_of_questions,
            created_by: outline.created_by,
            created_at: Utc::now(),
        };
        self.insert_outline(row.clone());
        Ok(row)
    }

    async fn get_outline(&self, id: Uuid) -> Result<Option<InterviewOutline>, StoreError> {
        Ok(self.tables.lock().unwrap().outlines.get(&id).cloned())
    }

    async fn count_answers(
        &self,
        interview_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<i64, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .answers
            .iter()
            .filter(|a| same_pair(a, interview_id, candidate_id))
            .count() as i64)
    }

    async fn list_answers(
        &self,
        interview_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Vec<AnswerRow>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<AnswerRow> = tables
            .answers
            .iter()
            .filter(|a| same_pair(a, interview_id, candidate_id))
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.question_number);
        Ok(rows)
    }

    async fn recent_unanswered_questions(
        &self,
        interview_id: Uuid,
        candidate_id: Uuid,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .asked
            .iter()
            .rev()
            .filter(|r| {
                r.interview_id == interview_id && r.candidate_id == candidate_id && !r.answered
            })
            .take(limit)
            .map(|r| r.question_text.clone())
            .collect())
    }

    async fn record_asked_question(&self, question: &NewAskedQuestion) -> Result<bool, StoreError> {
        self.asked_write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_asked_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }

        let mut tables = self.tables.lock().unwrap();
        let exists = tables.asked.iter().any(|r| {
            r.interview_id == question.interview_id
                && r.candidate_id == question.candidate_id
                && r.question_text == question.question_text
                && !r.answered
        });
        if exists {
            return Ok(false);
        }

        tables.asked.push(AskedQuestionRow {
            id: Uuid::new_v4(),
            interview_id: question.interview_id,
            candidate_id: question.candidate_id,
            question_text: question.question_text.clone(),
            source: question.source.clone(),
            displayed_at: Utc::now(),
            answered: false,
        });
        Ok(true)
    }

    async fn record_answer(&self, answer: &NewAnswer) -> Result<AnswerRow, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let taken = tables.answers.iter().any(|a| {
            same_pair(a, answer.interview_id, answer.candidate_id)
                && a.question_number == answer.question_number
        });
        if taken {
            return Err(StoreError::Conflict(format!(
                "question {} is already recorded",
                answer.question_number
            )));
        }

        let row = answer_row(answer);
        tables.answers.push(row.clone());
        Self::mark_answered(&mut tables, answer);
        Ok(row)
    }

    async fn upsert_answer(&self, answer: &NewAnswer) -> Result<AnswerRow, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let existing = tables.answers.iter_mut().find(|a| {
            same_pair(a, answer.interview_id, answer.candidate_id)
                && a.question_number == answer.question_number
        });

        let row = match existing {
            Some(row) => {
                row.question = answer.question.clone();
                if !answer.answer.is_empty() {
                    row.answer = answer.answer.clone();
                }
                row.ai_score = answer.ai_score;
                row.ai_feedback = answer.ai_feedback.clone();
                row.clone()
            }
            None => {
                let row = answer_row(answer);
                tables.answers.push(row.clone());
                row
            }
        };
        Self::mark_answered(&mut tables, answer);
        Ok(row)
    }

    async fn save_result(&self, result: &NewResult) -> Result<InterviewResultRow, StoreError> {
        let row = InterviewResultRow {
            id: Uuid::new_v4(),
            interview_id: result.interview_id,
            candidate_id: result.candidate_id,
            overall_score: result.overall_score,
            overall_feedback: result.overall_feedback.clone(),
            raw_payload: result.raw_payload.clone(),
            transcript_key: result.transcript_key.clone(),
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().results.push(row.clone());
        Ok(row)
    }

    async fn latest_result(
        &self,
        interview_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<InterviewResultRow>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .results
            .iter()
            .rev()
            .find(|r| r.interview_id == interview_id && r.candidate_id == candidate_id)
            .cloned())
    }
}
