//! Process entry point: load configuration, initialize tracing, wire the
//! in-memory store/orchestrator/compiler into a `PipelineService`, run the
//! startup reconciliation sweep, then serve the HTTP surface.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pipeline_control::config::{AppConfig, LogFormat};
use pipeline_control::dlq::InMemoryDlqStore;
use pipeline_control::expression::BlackBoxCompiler;
use pipeline_control::http::{create_router, AppState};
use pipeline_control::service::{InMemoryPipelineStore, LocalOrchestrator, PipelineService};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(config.log_format);

    tracing::info!(
        bind = %config.bind,
        quota = config.pipeline_quota,
        orchestrator = ?config.orchestrator,
        store = ?config.store,
        "starting pipeline control plane"
    );

    let pipelines = Arc::new(PipelineService::new(
        InMemoryPipelineStore::new(),
        LocalOrchestrator,
        Arc::new(BlackBoxCompiler),
        config.pipeline_quota,
    ));
    pipelines.clean_up_pipelines().await?;

    let state = AppState::new(pipelines, Arc::new(InMemoryDlqStore::new()), Arc::new(BlackBoxCompiler));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(bind = %config.bind, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()));

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
    }
}
