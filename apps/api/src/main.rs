mod config;
mod errors;
mod generation;
mod llm_client;
mod models;
mod render;
mod routes;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::generation::generator::CvGenerator;
use crate::llm_client::LlmClient;
use crate::render::{DocumentRenderer, WkhtmltopdfConverter};
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing env vars or converter binary)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SmartCV v{}", env!("CARGO_PKG_VERSION"));

    // Initialize completion client
    let llm = LlmClient::new(
        config.completion_api_url.clone(),
        config.openai_api_key.clone(),
        config.completion_model.clone(),
        config.completion_timeout,
    )?;
    info!("Completion client initialized (model: {})", config.completion_model);

    // Initialize renderer
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("Could not create output dir {}", config.output_dir.display()))?;
    let converter = WkhtmltopdfConverter::new(config.wkhtmltopdf_path.clone(), config.render_timeout);
    let renderer = DocumentRenderer::new(
        config.template_dir.clone(),
        config.output_dir.clone(),
        Arc::new(converter),
    );
    info!(
        "Renderer initialized (converter: {}, templates: {})",
        config.wkhtmltopdf_path.display(),
        config.template_dir.display()
    );

    // Build app state
    let state = AppState {
        generator: CvGenerator::new(Arc::new(llm), renderer),
        sessions: SessionStore::new(),
    };

    // Sweep sessions abandoned without a DELETE
    tokio::spawn(sweep_idle_sessions(
        state.sessions.clone(),
        config.session_idle_ttl,
        config.session_sweep_interval,
    ));

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically ends idle sessions and deletes their rendered files.
async fn sweep_idle_sessions(sessions: SessionStore, idle_ttl: Duration, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        let expired = sessions.sweep_idle(idle_ttl);
        if expired.is_empty() {
            continue;
        }
        for document in &expired {
            document.remove_files().await;
        }
        info!(
            "Swept {} expired document(s); {} session(s) remain",
            expired.len(),
            sessions.len()
        );
    }
}
