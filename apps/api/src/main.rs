mod candidates;
mod config;
mod db;
mod errors;
mod models;
mod notifications;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::candidates::PgCandidateRepository;
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::notifications::templates::TemplateCatalog;
use crate::notifications::SmtpMailer;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(default_log_directive(&config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting candidate tracker v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL and make sure the schema exists
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    // Initialize SMTP mailer (connects lazily on first send)
    let mailer = SmtpMailer::new(&config.mail)?;

    let templates = TemplateCatalog::builtin();
    info!(
        "Template catalog loaded: {:?}",
        templates.rounds().collect::<Vec<_>>()
    );

    // Build app state
    let state = AppState {
        candidates: Arc::new(PgCandidateRepository::new(db)),
        mailer: Arc::new(mailer),
        templates: Arc::new(templates),
    };

    // Build router
    let app = build_router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Our own crate plus `tower_http`, so `TraceLayer` request spans are visible.
fn default_log_directive(level: &str) -> String {
    format!(
        "{}={level},tower_http={level}",
        env!("CARGO_PKG_NAME").replace('-', "_")
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
