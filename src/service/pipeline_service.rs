//! Pipeline CRUD, quota enforcement, and lifecycle dispatch. Holds the
//! per-id lock for the duration of every mutating operation; reads go
//! straight to the store without a lock since a snapshot read of a
//! persisted config needs no coordination.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::domain::pipeline_config::{PipelineConfig, PipelineSummary, ResourcesConfig, IMMUTABLE_RESOURCE_POINTERS};
use crate::domain::status::{mark_failed, transition, PipelineAction, PipelineStatus};
use crate::error::{Result, ServiceError};
use crate::expression::ExpressionCompiler;
use crate::lowering::lower::lower;
use crate::lowering::migrate::migrate_pipeline_from_json;
use crate::lowering::pipeline_json::PipelineJson;

use super::locks::PipelineLocks;
use super::orchestrator::{Orchestrator, PipelineHealth};
use super::store::PipelineStore;

pub struct PipelineService<S: PipelineStore, O: Orchestrator> {
    store: S,
    orchestrator: O,
    compiler: Arc<dyn ExpressionCompiler>,
    locks: PipelineLocks,
    quota: usize,
}

impl<S: PipelineStore, O: Orchestrator> PipelineService<S, O> {
    pub fn new(store: S, orchestrator: O, compiler: Arc<dyn ExpressionCompiler>, quota: usize) -> Self {
        Self { store, orchestrator, compiler, locks: PipelineLocks::new(), quota }
    }

    #[tracing::instrument(skip(self, json), fields(pipeline_id = %json.pipeline_id))]
    pub async fn create_pipeline(&self, json: PipelineJson) -> Result<PipelineConfig> {
        let _guard = self.locks.acquire(&json.pipeline_id).await;

        if self.store.count().await? >= self.quota {
            return Err(ServiceError::forbidden("pipeline quota reached")
                .with_detail("quota", self.quota as u64));
        }
        if self.store.exists(&json.pipeline_id).await? {
            return Err(ServiceError::forbidden(format!(
                "pipeline id '{}' already exists",
                json.pipeline_id
            ))
            .with_detail("pipeline_id", json.pipeline_id.clone()));
        }

        let config = lower(json, self.compiler.as_ref())?;
        self.store.put(config.clone()).await?;
        self.orchestrator.deploy(&config).await?;
        Ok(config)
    }

    /// Accepts a previously exported pipeline document — current unified
    /// shape or legacy v1 — and persists it under `id`. This is the only
    /// caller of `migrate_pipeline_from_json`: a legacy export is promoted
    /// on the way in rather than requiring whoever is re-importing it to
    /// hand-convert the document into the unified shape first.
    #[tracing::instrument(skip(self, raw_json))]
    pub async fn import_pipeline(&self, id: &str, raw_json: &[u8]) -> Result<PipelineConfig> {
        let _guard = self.locks.acquire(id).await;

        if self.store.count().await? >= self.quota {
            return Err(ServiceError::forbidden("pipeline quota reached")
                .with_detail("quota", self.quota as u64));
        }
        if self.store.exists(id).await? {
            return Err(ServiceError::forbidden(format!("pipeline id '{id}' already exists"))
                .with_detail("pipeline_id", id.to_string()));
        }

        let config = migrate_pipeline_from_json(raw_json, id, self.compiler.as_ref())?;
        self.store.put(config.clone()).await?;
        self.orchestrator.deploy(&config).await?;
        Ok(config)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_pipeline(
        &self,
        id: &str,
        schema_overrides: &HashMap<String, String>,
    ) -> Result<PipelineConfig> {
        let config = self.require(id).await?;
        for source_id in schema_overrides.keys() {
            if !config.mapper.sources.contains_key(source_id) {
                return Err(ServiceError::unprocessable(format!(
                    "invalid schema selection: source '{source_id}' is not part of this pipeline"
                ))
                .with_detail("source_id", source_id.clone()));
            }
        }
        Ok(config)
    }

    pub async fn get_pipelines(&self) -> Result<Vec<PipelineSummary>> {
        Ok(self.store.list().await?.iter().map(PipelineSummary::from).collect())
    }

    #[tracing::instrument(skip(self, json))]
    pub async fn edit_pipeline(&self, id: &str, json: PipelineJson) -> Result<PipelineConfig> {
        let _guard = self.locks.acquire(id).await;
        let existing = self.require(id).await?;

        if json.pipeline_id != id {
            return Err(ServiceError::bad_request(
                "body pipeline_id must match the URL id",
            ));
        }
        if !existing.status.is_editable() {
            return Err(transition(existing.status, PipelineAction::Edit).unwrap_err().into());
        }

        let mut replacement = lower(json, self.compiler.as_ref())?;

        // `PipelineJson` carries no `resources` field at all; resources are
        // only ever touched through `update_pipeline_resources`, so an edit
        // always carries the existing value forward untouched rather than
        // comparing against the replacement's perpetually-empty one.
        replacement.resources = existing.resources.clone();
        replacement.status = existing.status;
        replacement.created_at = existing.created_at;
        replacement.updated_at = Utc::now();

        self.store.put(replacement.clone()).await?;
        self.orchestrator.deploy(&replacement).await?;
        Ok(replacement)
    }

    #[tracing::instrument(skip(self))]
    pub async fn stop_pipeline(&self, id: &str) -> Result<PipelineStatus> {
        let _guard = self.locks.acquire(id).await;
        let mut config = self.require(id).await?;
        let (transitional, eventual) = transition(config.status, PipelineAction::Stop)?;
        config.status = transitional;
        config.updated_at = Utc::now();
        self.store.put(config.clone()).await?;

        self.orchestrator.stop(id).await?;
        config.status = eventual;
        config.updated_at = Utc::now();
        self.store.put(config).await?;
        Ok(transitional)
    }

    #[tracing::instrument(skip(self))]
    pub async fn resume_pipeline(&self, id: &str) -> Result<PipelineStatus> {
        let _guard = self.locks.acquire(id).await;
        let mut config = self.require(id).await?;
        let (transitional, eventual) = transition(config.status, PipelineAction::Resume)?;
        config.status = transitional;
        config.updated_at = Utc::now();
        self.store.put(config.clone()).await?;

        self.orchestrator.resume(id).await?;
        config.status = eventual;
        config.updated_at = Utc::now();
        self.store.put(config).await?;
        Ok(transitional)
    }

    #[tracing::instrument(skip(self))]
    pub async fn terminate_pipeline(&self, id: &str) -> Result<PipelineStatus> {
        let _guard = self.locks.acquire(id).await;
        let mut config = self.require(id).await?;
        let (transitional, eventual) = transition(config.status, PipelineAction::Terminate)?;
        config.status = transitional;
        config.updated_at = Utc::now();
        self.store.put(config.clone()).await?;

        self.orchestrator.terminate(id).await?;
        config.status = eventual;
        config.updated_at = Utc::now();
        self.store.put(config).await?;
        Ok(transitional)
    }

    /// Reports a data-plane failure observed by the orchestrator out of
    /// band from a requester action: any non-terminal status moves straight
    /// to `Failed`.
    #[tracing::instrument(skip(self))]
    pub async fn mark_pipeline_failed(&self, id: &str) -> Result<Option<PipelineStatus>> {
        let _guard = self.locks.acquire(id).await;
        let mut config = self.require(id).await?;
        let Some(failed) = mark_failed(config.status) else {
            return Ok(None);
        };
        config.status = failed;
        config.updated_at = Utc::now();
        self.store.put(config).await?;
        Ok(Some(failed))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_pipeline(&self, id: &str) -> Result<()> {
        let _guard = self.locks.acquire(id).await;
        let existing = self.require(id).await?;
        transition(existing.status, PipelineAction::Delete)?;
        self.store.delete(id).await?;
        Ok(())
    }

    pub async fn update_pipeline_name(&self, id: &str, name: String) -> Result<PipelineConfig> {
        let _guard = self.locks.acquire(id).await;
        let mut config = self.require(id).await?;
        config.name = name;
        config.updated_at = Utc::now();
        self.store.put(config.clone()).await?;
        Ok(config)
    }

    pub async fn update_pipeline_metadata(
        &self,
        id: &str,
        metadata: HashMap<String, String>,
    ) -> Result<PipelineConfig> {
        let _guard = self.locks.acquire(id).await;
        let mut config = self.require(id).await?;
        config.metadata = metadata;
        config.updated_at = Utc::now();
        self.store.put(config.clone()).await?;
        Ok(config)
    }

    pub async fn update_pipeline_resources(
        &self,
        id: &str,
        resources: ResourcesConfig,
    ) -> Result<PipelineConfig> {
        let _guard = self.locks.acquire(id).await;
        let mut config = self.require(id).await?;
        check_immutable_resources(config.resources.as_ref(), Some(&resources))?;
        config.resources = Some(resources);
        config.updated_at = Utc::now();
        self.store.put(config.clone()).await?;
        Ok(config)
    }

    pub async fn get_pipeline_health(&self, id: &str) -> Result<PipelineHealth> {
        self.require(id).await?;
        self.orchestrator.health(id).await
    }

    pub fn get_orchestrator_type(&self) -> &'static str {
        self.orchestrator.name()
    }

    /// Reconciliation sweep run once at startup.
    #[tracing::instrument(skip(self))]
    pub async fn clean_up_pipelines(&self) -> Result<()> {
        self.orchestrator.reconcile().await
    }

    async fn require(&self, id: &str) -> Result<PipelineConfig> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!("pipeline '{id}' does not exist"))
                    .with_detail("pipeline_id", id.to_string())
            })
    }
}

/// Every field named by `IMMUTABLE_RESOURCE_POINTERS` must equal its prior
/// value on an edit. A pointer that was never set before (`old` is `None`,
/// or the prior `ResourcesConfig` left that particular pointer `None`) has
/// nothing to conflict with yet, so setting it for the first time is
/// always allowed; only a change away from a previously-set value is
/// rejected.
fn check_immutable_resources(old: Option<&ResourcesConfig>, new: Option<&ResourcesConfig>) -> Result<()> {
    let Some(old) = old else { return Ok(()) };
    let new = new.cloned().unwrap_or_default();

    let reject = |pointer: &'static str| {
        Err(ServiceError::unprocessable(format!("resource field '{pointer}' is immutable after create"))
            .with_detail("field", pointer))
    };

    if old.nats.stream.max_age.is_some() && old.nats.stream.max_age != new.nats.stream.max_age {
        return reject(IMMUTABLE_RESOURCE_POINTERS[0]);
    }
    if old.nats.stream.max_bytes.is_some() && old.nats.stream.max_bytes != new.nats.stream.max_bytes {
        return reject(IMMUTABLE_RESOURCE_POINTERS[1]);
    }
    if old.transform.storage.size.is_some() && old.transform.storage.size != new.transform.storage.size {
        return reject(IMMUTABLE_RESOURCE_POINTERS[2]);
    }
    if old.join.replicas.is_some() && old.join.replicas != new.join.replicas {
        return reject(IMMUTABLE_RESOURCE_POINTERS[3]);
    }
    Ok(())
}
