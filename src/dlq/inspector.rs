//! DLQ inspection. The actual dead-letter stream lives in NATS JetStream,
//! out of scope for this core; `DlqStore` is the seam, and the
//! in-memory implementation here lets the service and HTTP layers be built
//! and tested without that dependency, same pattern as `PipelineStore`.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::pipeline_config::{DlqMessage, DlqState};
use crate::error::{Result, ServiceError};

pub const DLQ_DEFAULT_BATCH_SIZE: usize = 10;
pub const DLQ_MAX_BATCH_SIZE: usize = 1000;

#[async_trait]
pub trait DlqStore: Send + Sync {
    async fn fetch(&self, stream: &str, batch_size: usize) -> Result<Vec<DlqMessage>>;
    async fn state(&self, stream: &str) -> Result<DlqState>;
    async fn purge(&self, stream: &str) -> Result<()>;
}

#[derive(Debug, Default)]
struct DlqStream {
    messages: Vec<DlqMessage>,
    state: DlqState,
}

/// Queue-style store: `fetch` is consuming, so fetched messages leave the
/// backlog, but `total_messages` only ever resets on `purge` — it is never
/// decremented by a fetch.
#[derive(Debug, Default)]
pub struct InMemoryDlqStore {
    streams: DashMap<String, DlqStream>,
}

impl InMemoryDlqStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/seed hook: data-plane components would call something like this
    /// to land a failed message in the DLQ; there is no HTTP route for it.
    pub fn push(&self, stream: &str, message: DlqMessage) {
        let mut entry = self.streams.entry(stream.to_string()).or_default();
        entry.state.total_messages += 1;
        entry.state.unconsumed_messages += 1;
        entry.state.last_received_at = Some(chrono::Utc::now());
        entry.messages.push(message);
    }
}

#[async_trait]
impl DlqStore for InMemoryDlqStore {
    async fn fetch(&self, stream: &str, batch_size: usize) -> Result<Vec<DlqMessage>> {
        if batch_size == 0 || batch_size > DLQ_MAX_BATCH_SIZE {
            return Err(ServiceError::unprocessable(format!(
                "batch_size must be between 1 and {DLQ_MAX_BATCH_SIZE}"
            )));
        }
        let mut entry = self
            .streams
            .get_mut(stream)
            .ok_or_else(|| dlq_not_exists(stream))?;
        // An empty backlog is not itself an error: the HTTP layer maps a
        // zero-length result to 204 No Content.
        let take = batch_size.min(entry.messages.len());
        let drained: Vec<DlqMessage> = entry.messages.drain(0..take).collect();
        entry.state.last_consumed_at = Some(chrono::Utc::now());
        entry.state.unconsumed_messages = entry.state.unconsumed_messages.saturating_sub(drained.len() as u64);
        Ok(drained)
    }

    async fn state(&self, stream: &str) -> Result<DlqState> {
        self.streams
            .get(stream)
            .map(|e| e.state.clone())
            .ok_or_else(|| dlq_not_exists(stream))
    }

    async fn purge(&self, stream: &str) -> Result<()> {
        let mut entry = self
            .streams
            .get_mut(stream)
            .ok_or_else(|| dlq_not_exists(stream))?;
        entry.messages.clear();
        entry.state = DlqState::default();
        Ok(())
    }
}

fn dlq_not_exists(stream: &str) -> ServiceError {
    ServiceError::not_found(format!("dlq for pipeline_id '{stream}' does not exist"))
        .with_detail("stream", stream.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg() -> DlqMessage {
        DlqMessage { component: "sink".into(), error: "connect refused".into(), original_message: vec![1, 2, 3] }
    }

    #[tokio::test]
    async fn fetch_clamps_to_available_and_marks_consumed() {
        let store = InMemoryDlqStore::new();
        store.push("p1.dlq", msg());
        store.push("p1.dlq", msg());
        let batch = store.fetch("p1.dlq", 10).await.unwrap();
        assert_eq!(batch.len(), 2);
        let state = store.state("p1.dlq").await.unwrap();
        assert_eq!(state.total_messages, 2);
        assert_eq!(state.unconsumed_messages, 0);
    }

    #[tokio::test]
    async fn fetch_rejects_batch_size_above_max() {
        let store = InMemoryDlqStore::new();
        store.push("p1.dlq", msg());
        let err = store.fetch("p1.dlq", DLQ_MAX_BATCH_SIZE + 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unprocessable { .. }));
        // The call must not touch the stream.
        assert_eq!(store.state("p1.dlq").await.unwrap().unconsumed_messages, 1);
    }

    #[tokio::test]
    async fn fetch_on_drained_stream_returns_empty_not_an_error() {
        let store = InMemoryDlqStore::new();
        store.push("p1.dlq", msg());
        store.fetch("p1.dlq", 10).await.unwrap();
        let batch = store.fetch("p1.dlq", 10).await.unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn fetch_on_never_created_stream_is_not_found() {
        let store = InMemoryDlqStore::new();
        let err = store.fetch("ghost.dlq", 10).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn purge_resets_counters() {
        let store = InMemoryDlqStore::new();
        store.push("p1.dlq", msg());
        store.purge("p1.dlq").await.unwrap();
        let state = store.state("p1.dlq").await.unwrap();
        assert_eq!(state.total_messages, 0);
        assert_eq!(state.unconsumed_messages, 0);
    }

    #[tokio::test]
    async fn purge_absent_stream_is_not_found() {
        let store = InMemoryDlqStore::new();
        let err = store.purge("ghost.dlq").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn unconsumed_never_exceeds_total() {
        let store = InMemoryDlqStore::new();
        store.push("p1.dlq", msg());
        store.push("p1.dlq", msg());
        store.fetch("p1.dlq", 1).await.unwrap();
        let state = store.state("p1.dlq").await.unwrap();
        assert!(state.unconsumed_messages <= state.total_messages);
    }
}
