use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;

use crate::config::Config;
use crate::interview::chat::InterviewChat;
use crate::session::store::InterviewStore;
use crate::session::tracker::SessionTracker;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres in production, in-memory in tests.
    pub store: Arc<dyn InterviewStore>,
    /// Owns the per-session locks; one instance per process.
    pub tracker: Arc<SessionTracker>,
    pub chat: Arc<InterviewChat>,
    pub s3: S3Client,
    pub config: Config,
}
