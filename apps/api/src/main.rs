mod config;
mod db;
mod errors;
mod interview;
mod llm_client;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::interview::answer_evaluator::LlmAnswerEvaluator;
use crate::interview::controller::SessionLifecycleController;
use crate::interview::persistence::{
    NoopPersistence, PersistenceHandle, PgSessionPersistence, SessionPersistence,
};
use crate::interview::question_generator::LlmQuestionGenerator;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.db_max_connections).await?;
    ensure_schema(&db).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_timeout())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Durable copy of sessions, written in the background
    let sink: Arc<dyn SessionPersistence> = if config.persistence_enabled {
        Arc::new(PgSessionPersistence::new(db.clone()))
    } else {
        info!("Session persistence disabled; interviews are kept in memory only");
        Arc::new(NoopPersistence)
    };
    let (persistence, writer) = PersistenceHandle::spawn(sink);

    let interviews = Arc::new(SessionLifecycleController::new(
        Arc::new(LlmQuestionGenerator::new(llm.clone())),
        Arc::new(LlmAnswerEvaluator::new(llm)),
        persistence,
    ));

    let state = AppState {
        db,
        config: config.clone(),
        interviews,
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict allowed origins once the web client has a fixed host
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router held the last controller; its drop closes the queue.
    info!("Draining pending session writes");
    writer.await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
