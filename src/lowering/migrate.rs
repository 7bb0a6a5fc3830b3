//! Accepts a previously persisted pipeline document, in either the current
//! unified shape or the legacy (v1) shape with per-topic `schema.fields` and
//! a sink-level `table_mapping` list, and lowers it under a caller-supplied
//! id. Unknown top-level fields such as `version`, `exported_at`,
//! `exported_by` are ignored by construction: `PipelineJson` does not use
//! `deny_unknown_fields`.

use crate::domain::pipeline_config::PipelineConfig;
use crate::error::{Result, ServiceError};
use crate::expression::ExpressionCompiler;

use super::lower::lower;
use super::pipeline_json::{PipelineJson, SchemaFieldJson};

/// Deserializes `json_bytes` into a `PipelineConfig`, promoting a legacy (v1)
/// document to the unified shape first if needed, and overrides the result's
/// id to `pipeline_id`.
pub fn migrate_pipeline_from_json(
    json_bytes: &[u8],
    pipeline_id: &str,
    compiler: &dyn ExpressionCompiler,
) -> Result<PipelineConfig> {
    let mut doc: PipelineJson = serde_json::from_slice(json_bytes)
        .map_err(|e| ServiceError::bad_request(format!("invalid pipeline document: {e}")))?;

    promote_legacy_shape(&mut doc);
    doc.pipeline_id = pipeline_id.to_string();

    lower(doc, compiler)
}

/// Detects the v1 shape (per-topic `schema`, or sink `table_mapping`) and
/// synthesizes the unified top-level `schema.fields[]` from it. A no-op if
/// the document already carries unified fields.
fn promote_legacy_shape(doc: &mut PipelineJson) {
    if !doc.schema.fields.is_empty() {
        return;
    }

    let mut synthesized: Vec<SchemaFieldJson> = Vec::new();
    for topic in &doc.source.topics {
        if let Some(legacy_schema) = &topic.schema {
            for field in &legacy_schema.fields {
                synthesized.push(SchemaFieldJson {
                    source_id: topic.name.clone(),
                    name: field.name.clone(),
                    field_type: field.field_type.clone(),
                    column_name: None,
                    column_type: None,
                });
            }
        }
    }

    if let Some(mappings) = &doc.sink.table_mapping {
        for mapping in mappings {
            if let Some(existing) = synthesized
                .iter_mut()
                .find(|f| f.source_id == mapping.source_id && f.name == mapping.field_name)
            {
                existing.column_name = Some(mapping.column_name.clone());
                existing.column_type = Some(mapping.column_type.clone());
            } else {
                synthesized.push(SchemaFieldJson {
                    source_id: mapping.source_id.clone(),
                    name: mapping.field_name.clone(),
                    field_type: "string".to_string(),
                    column_name: Some(mapping.column_name.clone()),
                    column_type: Some(mapping.column_type.clone()),
                });
            }
        }
    }

    if !synthesized.is_empty() {
        doc.schema.fields = synthesized;
    }
}
