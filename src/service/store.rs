//! Persistence abstraction: a key-value store keyed by pipeline id.
//! Behavior lives behind a trait so the service layer never depends on a
//! concrete backend; the only implementation shipped here is in-memory.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::pipeline_config::PipelineConfig;
use crate::error::Result;

#[async_trait]
pub trait PipelineStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<PipelineConfig>>;
    async fn list(&self) -> Result<Vec<PipelineConfig>>;
    async fn put(&self, config: PipelineConfig) -> Result<()>;
    async fn delete(&self, id: &str) -> Result<()>;
    async fn exists(&self, id: &str) -> Result<bool>;
    async fn count(&self) -> Result<usize>;
}

#[derive(Debug, Default)]
pub struct InMemoryPipelineStore {
    entries: DashMap<String, PipelineConfig>,
}

impl InMemoryPipelineStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PipelineStore for InMemoryPipelineStore {
    async fn get(&self, id: &str) -> Result<Option<PipelineConfig>> {
        Ok(self.entries.get(id).map(|e| e.value().clone()))
    }

    async fn list(&self) -> Result<Vec<PipelineConfig>> {
        Ok(self.entries.iter().map(|e| e.value().clone()).collect())
    }

    async fn put(&self, config: PipelineConfig) -> Result<()> {
        self.entries.insert(config.id.clone(), config);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.entries.remove(id);
        Ok(())
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.entries.contains_key(id))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.len())
    }
}
