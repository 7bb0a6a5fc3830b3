//! The external, client-facing pipeline document. `lower::lower` turns this
//! into the internal `PipelineConfig`; legacy (v1) documents are promoted
//! first by `migrate`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const KAFKA_SOURCE_TYPE: &str = "kafka";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineJson {
    pub pipeline_id: String,
    pub name: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub source: SourceJson,
    #[serde(default)]
    pub join: Option<JoinJson>,
    #[serde(default)]
    pub filter: Option<FilterJson>,
    #[serde(default, rename = "stateless_transformation")]
    pub stateless_transformation: Option<StatelessTransformationJson>,
    pub sink: SinkJson,
    pub schema: SchemaJson,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceJson {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub connection_params: ConnectionParamsJson,
    pub topics: Vec<TopicJson>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConnectionParamsJson {
    #[serde(default)]
    pub brokers: Vec<String>,
    #[serde(default)]
    pub sasl_protocol: Option<String>,
    #[serde(default)]
    pub sasl_mechanism: Option<String>,
    #[serde(default)]
    pub sasl_username: Option<String>,
    #[serde(default)]
    pub sasl_password: Option<String>,
    #[serde(default)]
    pub tls_enabled: bool,
    #[serde(default)]
    pub tls_skip_verify: bool,
    #[serde(default)]
    pub kerberos_service_name: Option<String>,
    #[serde(default)]
    pub kerberos_keytab: Option<String>,
    #[serde(default)]
    pub kerberos_principal: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TopicJson {
    pub name: String,
    #[serde(default = "default_offset")]
    pub consumer_group_initial_offset: String,
    #[serde(default = "default_replicas")]
    pub replicas: u32,
    #[serde(default)]
    pub deduplication: Option<DeduplicationJson>,
    /// Legacy (v1) documents nest the per-source schema fields under the
    /// topic instead of the top-level `schema.fields[]`.
    #[serde(default)]
    pub schema: Option<LegacyTopicSchemaJson>,
}

fn default_offset() -> String {
    "earliest".to_string()
}

fn default_replicas() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeduplicationJson {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub id_field: String,
    #[serde(default)]
    pub id_field_type: String,
    #[serde(default)]
    pub time_window: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LegacyTopicSchemaJson {
    pub fields: Vec<LegacySchemaFieldJson>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LegacySchemaFieldJson {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JoinJson {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, rename = "type")]
    pub join_type: String,
    #[serde(default)]
    pub sources: Vec<JoinSourceJson>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JoinSourceJson {
    pub source_id: String,
    pub join_key: String,
    /// Duration string, e.g. `"1h"`, `"24h"`, `"90s"`.
    pub window: String,
    pub orientation: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterJson {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub expression: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatelessTransformationJson {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub config: TransformationConfigJson,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransformationConfigJson {
    #[serde(default)]
    pub transform: Vec<TransformExpressionJson>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransformExpressionJson {
    pub expression: String,
    pub output_name: String,
    pub output_type: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SinkJson {
    #[serde(default, rename = "type")]
    pub sink_type: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub http_port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub table: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub skip_certificate_verification: bool,
    pub max_batch_size: u64,
    #[serde(default)]
    pub max_delay_time: u64,
    /// Legacy (v1) sinks carry their own mapping list instead of relying on
    /// the top-level `schema.fields[]` column metadata.
    #[serde(default)]
    pub table_mapping: Option<Vec<LegacyTableMappingJson>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LegacyTableMappingJson {
    pub source_id: String,
    pub field_name: String,
    pub column_name: String,
    pub column_type: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SchemaJson {
    #[serde(default)]
    pub fields: Vec<SchemaFieldJson>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchemaFieldJson {
    pub source_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub column_name: Option<String>,
    #[serde(default)]
    pub column_type: Option<String>,
}
