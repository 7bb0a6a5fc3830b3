pub mod inspector;

pub use inspector::{DlqStore, InMemoryDlqStore, DLQ_DEFAULT_BATCH_SIZE, DLQ_MAX_BATCH_SIZE};
