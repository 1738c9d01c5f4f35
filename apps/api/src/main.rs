mod config;
mod db;
mod errors;
mod interview;
mod llm_client;
mod models;
mod routes;
mod session;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::interview::chat::InterviewChat;
use crate::interview::evaluator::AnswerEvaluator;
use crate::interview::generator::QuestionGenerator;
use crate::llm_client::{LlmClient, TextGenerator};
use crate::routes::build_router;
use crate::session::store::{InterviewStore, PgInterviewStore};
use crate::session::tracker::SessionTracker;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting interview API v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url, config.database_max_connections).await?;
    let store: Arc<dyn InterviewStore> = Arc::new(PgInterviewStore::new(db));

    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    let settings = config.generation.clone();
    let llm: Arc<dyn TextGenerator> = Arc::new(LlmClient::new(
        config.anthropic_api_key.clone(),
        settings.llm_timeout,
    )?);
    info!(
        "LLM client initialized (model: {}, timeout {:?})",
        llm_client::MODEL,
        settings.llm_timeout
    );
    info!(
        "Question generation: similarity threshold {}, {} attempts, history {}",
        settings.similarity_threshold, settings.max_attempts, settings.history_limit
    );
    if config.results_callback_token.is_none() {
        info!("RESULTS_CALLBACK_TOKEN not set; results callback will reject all requests");
    }

    let tracker = SessionTracker::new(
        store.clone(),
        QuestionGenerator::new(llm.clone(), settings.clone()),
        AnswerEvaluator::new(llm.clone(), settings.llm_timeout),
    );

    let state = AppState {
        store,
        tracker: Arc::new(tracker),
        chat: Arc::new(InterviewChat::new(llm, settings.llm_timeout)),
        s3,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "interview-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
