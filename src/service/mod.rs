pub mod locks;
pub mod orchestrator;
pub mod pipeline_service;
pub mod store;

pub use orchestrator::{LocalOrchestrator, Orchestrator, PipelineHealth};
pub use pipeline_service::PipelineService;
pub use store::{InMemoryPipelineStore, PipelineStore};
