pub mod clickhouse_types;
pub mod kafka_type;
pub mod pipeline_config;
pub mod status;
pub mod streams;

pub use pipeline_config::*;
pub use status::{mark_failed, transition, PipelineAction, PipelineStatus};
