//! Shared application state handed to every handler: a small `Clone` struct
//! of `Arc`-wrapped collaborators, built once in `main` and cheap to pass
//! into `axum::Router::with_state`.

use std::sync::Arc;

use crate::dlq::DlqStore;
use crate::expression::ExpressionCompiler;
use crate::service::{InMemoryPipelineStore, LocalOrchestrator, PipelineService};

/// The only `PipelineStore`/`Orchestrator` pair this repository ships.
pub type Pipelines = PipelineService<InMemoryPipelineStore, LocalOrchestrator>;

#[derive(Clone)]
pub struct AppState {
    pub pipelines: Arc<Pipelines>,
    pub dlq: Arc<dyn DlqStore>,
    pub compiler: Arc<dyn ExpressionCompiler>,
}

impl AppState {
    pub fn new(
        pipelines: Arc<Pipelines>,
        dlq: Arc<dyn DlqStore>,
        compiler: Arc<dyn ExpressionCompiler>,
    ) -> Self {
        Self { pipelines, dlq, compiler }
    }
}
