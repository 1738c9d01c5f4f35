use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::InterviewResultRow;
use crate::models::outline::{InterviewOutline, NewOutline};
use crate::session::ingest::{authorize, ResultsCallback, CALLBACK_TOKEN_HEADER};
use crate::session::results::{compute_aggregate, AggregateResult};
use crate::session::tracker::{SessionStep, SubmitOutcome};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CandidateQuery {
    pub candidate_id: Uuid,
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    pub candidate_id: Uuid,
    pub question: String,
    pub answer: String,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub candidate_id: Uuid,
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Serialize)]
pub struct ResultResponse {
    pub aggregate: AggregateResult,
    pub latest: Option<InterviewResultRow>,
}

async fn load_outline(state: &AppState, id: Uuid) -> Result<InterviewOutline, AppError> {
    state
        .store
        .get_outline(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))
}

/// POST /api/v1/interviews
pub async fn handle_create_interview(
    State(state): State<AppState>,
    Json(req): Json<NewOutline>,
) -> Result<(StatusCode, Json<InterviewOutline>), AppError> {
    if let Some(reason) = req.validation_error() {
        return Err(AppError::Validation(reason));
    }
    let outline = state.store.create_outline(&req).await?;
    tracing::info!(
        "Created interview {} ({} questions)",
        outline.id,
        outline.number_of_questions
    );
    Ok((StatusCode::CREATED, Json(outline)))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewOutline>, AppError> {
    Ok(Json(load_outline(&state, id).await?))
}

/// GET /api/v1/interviews/:id/session?candidate_id=
pub async fn handle_next_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<CandidateQuery>,
) -> Result<Json<SessionStep>, AppError> {
    let step = state.tracker.next_step(id, params.candidate_id).await?;
    Ok(Json(step))
}

/// POST /api/v1/interviews/:id/session
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<SubmitOutcome>, AppError> {
    if req.question.trim().is_empty() {
        return Err(AppError::Validation("question cannot be empty".to_string()));
    }
    if req.answer.trim().is_empty() {
        return Err(AppError::Validation("answer cannot be empty".to_string()));
    }

    let outcome = state
        .tracker
        .submit_answer(id, req.candidate_id, req.question.trim(), req.answer.trim())
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/interviews/:id/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::Validation("message cannot be empty".to_string()));
    }
    let outline = load_outline(&state, id).await?;
    tracing::debug!("Chat message from candidate {} on interview {id}", req.candidate_id);

    let reply = state.chat.reply(&outline, req.message.trim()).await;
    Ok(Json(ChatResponse { reply }))
}

/// POST /api/v1/interviews/:id/results/:candidate_id/freeze
pub async fn handle_freeze_result(
    State(state): State<AppState>,
    Path((id, candidate_id)): Path<(Uuid, Uuid)>,
) -> Result<(StatusCode, Json<InterviewResultRow>), AppError> {
    let row = state
        .tracker
        .freeze(&state.s3, &state.config.s3_bucket, id, candidate_id)
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/interviews/:id/results/:candidate_id
pub async fn handle_get_result(
    State(state): State<AppState>,
    Path((id, candidate_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ResultResponse>, AppError> {
    let outline = load_outline(&state, id).await?;
    let answers = state.store.list_answers(id, candidate_id).await?;
    let latest = state.store.latest_result(id, candidate_id).await?;
    Ok(Json(ResultResponse {
        aggregate: compute_aggregate(&outline, candidate_id, &answers),
        latest,
    }))
}

/// POST /api/v1/results/callback
pub async fn handle_results_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ResultsCallback>,
) -> Result<(StatusCode, Json<InterviewResultRow>), AppError> {
    let presented = headers
        .get(CALLBACK_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    authorize(state.config.results_callback_token.as_deref(), presented)?;

    let row = state.tracker.ingest_results(&payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}
