//! Per-pipeline-id locking: a sharded map of locks keyed by pipeline id, so
//! a mutating operation on one pipeline never blocks a mutating operation
//! on another. `DashMap` already shards internally, so no coarser lock is
//! needed around insert/remove here.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct PipelineLocks {
    inner: DashMap<String, Arc<Mutex<()>>>,
}

impl PipelineLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `id`, creating it on first use. Held for the
    /// duration of one mutating operation.
    pub async fn acquire(&self, id: &str) -> OwnedMutexGuard<()> {
        let mutex = self
            .inner
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        mutex.lock_owned().await
    }
}
