pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Outlines
        .route("/api/v1/interviews", post(handlers::handle_create_interview))
        .route("/api/v1/interviews/:id", get(handlers::handle_get_interview))
        // Candidate session
        .route(
            "/api/v1/interviews/:id/session",
            get(handlers::handle_next_question).post(handlers::handle_submit_answer),
        )
        .route("/api/v1/interviews/:id/chat", post(handlers::handle_chat))
        // Results
        .route(
            "/api/v1/interviews/:id/results/:candidate_id",
            get(handlers::handle_get_result),
        )
        .route(
            "/api/v1/interviews/:id/results/:candidate_id/freeze",
            post(handlers::handle_freeze_result),
        )
        .route(
            "/api/v1/results/callback",
            post(handlers::handle_results_callback),
        )
        .with_state(state)
}
