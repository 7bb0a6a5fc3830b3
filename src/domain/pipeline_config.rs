use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::PipelineStatus;

pub const PIPELINE_CONFIG_VERSION: &str = "v2";

/// Root persisted entity. Every field here is what the service reads and
/// writes; the wire shape clients post is `PipelineJson`
/// (`crate::lowering::pipeline_json`), which lowers into this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub version: String,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub status: PipelineStatus,
    pub ingestor: IngestorConfig,
    pub join: Option<JoinConfig>,
    pub filter: Option<FilterConfig>,
    pub stateless_transform: Option<TransformConfig>,
    pub sink: SinkConfig,
    pub mapper: MapperConfig,
    pub resources: Option<ResourcesConfig>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PipelineConfig {
    /// Transform output id referenced by `mapping.source_id` when a
    /// stateless transform is enabled.
    pub fn transform_output_id(&self) -> &'static str {
        "transform"
    }

    pub fn has_transform(&self) -> bool {
        self.stateless_transform.as_ref().is_some_and(|t| t.enabled)
    }

    pub fn has_filter(&self) -> bool {
        self.filter.as_ref().is_some_and(|f| f.enabled)
    }

    pub fn has_join(&self) -> bool {
        self.join.as_ref().is_some_and(|j| j.enabled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestorConfig {
    pub kind: String,
    pub provider: String,
    pub connection: KafkaConnectionParams,
    pub topics: Vec<KafkaTopicsConfig>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KafkaConnectionParams {
    pub brokers: Vec<String>,
    pub sasl_protocol: Option<String>,
    pub sasl_mechanism: Option<String>,
    pub sasl_username: Option<String>,
    pub sasl_password: Option<String>,
    pub tls_enabled: bool,
    pub tls_skip_verify: bool,
    pub kerberos_service_name: Option<String>,
    pub kerberos_keytab: Option<String>,
    pub kerberos_principal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KafkaTopicsConfig {
    pub name: String,
    pub consumer_group: String,
    pub consumer_group_initial_offset: String,
    pub replicas: u32,
    pub dedup: DeduplicationConfig,
    pub ingestor_stream: String,
    pub dedup_output_stream: String,
    pub ingestor_consumer: String,
    pub dedup_consumer: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeduplicationConfig {
    pub enabled: bool,
    pub id_field: String,
    pub id_field_type: String,
    pub time_window_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinOrientation {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinConfig {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub join_type: String,
    pub sources: Vec<JoinSourceConfig>,
    pub output_stream_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinSourceConfig {
    pub source_id: String,
    pub join_key: String,
    pub window_seconds: u64,
    pub orientation: JoinOrientation,
    pub input_stream: String,
    pub consumer_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub enabled: bool,
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    pub enabled: bool,
    pub transforms: Vec<TransformExpression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformExpression {
    pub expression: String,
    pub output_name: String,
    pub output_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkConfig {
    pub host: String,
    pub port: u16,
    pub http_port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub table: String,
    pub secure: bool,
    pub skip_certificate_verification: bool,
    pub max_batch_size: u64,
    pub max_delay_time_seconds: u64,
    pub input_stream: String,
    pub consumer_name: String,
}

impl SinkConfig {
    pub const DEFAULT_MAX_DELAY_TIME_SECONDS: u64 = 60;
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapperConfig {
    pub sources: HashMap<String, SourceMapping>,
    pub sink_mapping: Vec<SinkMappingRow>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceMapping {
    pub fields: Vec<SchemaField>,
    pub join_key_field: Option<String>,
    pub join_orientation: Option<JoinOrientation>,
    pub join_window_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkMappingRow {
    pub stream_name: String,
    pub source_id: String,
    pub field_name: String,
    pub column_name: String,
    pub column_type: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourcesConfig {
    pub requests: Option<HashMap<String, String>>,
    pub limits: Option<HashMap<String, String>>,
    pub nats: NatsResources,
    pub transform: TransformResources,
    pub join: JoinResources,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NatsResources {
    pub stream: NatsStreamResources,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NatsStreamResources {
    /// Immutable after create (JSON-pointer `nats/stream/maxAge`).
    pub max_age: Option<String>,
    /// Immutable after create (JSON-pointer `nats/stream/maxBytes`).
    pub max_bytes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransformResources {
    pub storage: TransformStorageResources,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransformStorageResources {
    /// Immutable after create (JSON-pointer `transform/storage/size`).
    pub size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JoinResources {
    /// Immutable after create (JSON-pointer `join/replicas`).
    pub replicas: Option<u32>,
}

/// The four resource fields whose value in a subsequent edit must equal
/// their value at creation time; everything else under `resources` can be
/// changed via `UpdatePipelineResources`.
pub const IMMUTABLE_RESOURCE_POINTERS: &[&str] = &[
    "nats/stream/maxAge",
    "nats/stream/maxBytes",
    "transform/storage/size",
    "join/replicas",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DlqMessage {
    pub component: String,
    pub error: String,
    pub original_message: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DlqState {
    pub last_received_at: Option<DateTime<Utc>>,
    pub last_consumed_at: Option<DateTime<Utc>>,
    pub total_messages: u64,
    pub unconsumed_messages: u64,
}

/// Summary view returned by `GET /api/v1/pipeline`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub id: String,
    pub name: String,
    pub status: PipelineStatus,
    pub metadata: HashMap<String, String>,
}

impl From<&PipelineConfig> for PipelineSummary {
    fn from(cfg: &PipelineConfig) -> Self {
        Self {
            id: cfg.id.clone(),
            name: cfg.name.clone(),
            status: cfg.status,
            metadata: cfg.metadata.clone(),
        }
    }
}
