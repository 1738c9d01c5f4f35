use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Upper bound on `number_of_questions` accepted from HR users.
pub const MAX_QUESTIONS_PER_INTERVIEW: i32 = 50;

/// HR-authored interview template. Immutable for the duration of a session.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewOutline {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub required_skills: String,
    pub responsibilities: String,
    pub evaluation_criteria: String,
    pub number_of_questions: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating an outline.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOutline {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_skills: String,
    #[serde(default)]
    pub responsibilities: String,
    #[serde(default)]
    pub evaluation_criteria: String,
    #[serde(default = "default_question_count")]
    pub number_of_questions: i32,
    pub created_by: Uuid,
}

fn default_question_count() -> i32 {
    5
}

impl NewOutline {
    /// Returns a human-readable reason when the outline cannot be stored.
    pub fn validation_error(&self) -> Option<String> {
        if self.title.trim().is_empty() {
            return Some("title cannot be empty".to_string());
        }
        if !(1..=MAX_QUESTIONS_PER_INTERVIEW).contains(&self.number_of_questions) {
            return Some(format!(
                "number_of_questions must be between 1 and {MAX_QUESTIONS_PER_INTERVIEW}"
            ));
        }
        None
    }
}
