pub mod error;
pub mod handlers;

use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, post},
};
use colored::Colorize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::cli::ServeArgs;
use crate::config::Config;
use crate::translate::{Translator, llm, load_glossary};

/// Shared per-process state; everything inside is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub translator: Translator,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/translate", post(handlers::translate))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let mut cfg = Config::resolve(&args.backend)?;
    if let Some(host) = args.host {
        cfg.server.host = host;
    }
    if let Some(port) = args.port {
        cfg.server.port = port;
    }

    // A bad glossary must stop startup before any request is served.
    let glossary = Arc::new(load_glossary(&cfg)?);
    let provider: Arc<dyn llm::CompletionProvider> =
        llm::create_provider(cfg.llm_config())?.into();
    let info = provider.describe();

    let app = router(AppState {
        translator: Translator::new(glossary.clone(), provider),
    });

    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!(
        "{}",
        format!(
            "[Serve] meditongue on http://{} (backend={}, model={})",
            addr, info.backend, info.model
        )
        .green()
    );
    tracing::info!(
        backend = %info.backend,
        base_url = %info.base_url,
        glossary_terms = glossary.len(),
        "Server listening on {}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
