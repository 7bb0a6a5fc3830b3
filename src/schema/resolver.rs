//! Groups the unified `schema.fields[]` by source, enriches each source with
//! its join participation, and produces the sink column mapping. Pure,
//! synchronous, and independent of persistence or the HTTP layer so it is
//! directly unit-testable.

use std::collections::HashMap;

use crate::domain::kafka_type::normalize_to_basic_kafka_type;
use crate::domain::pipeline_config::{SchemaField, SinkMappingRow, SourceMapping};
use crate::error::{Result, ServiceError};
use crate::lowering::pipeline_json::{JoinJson, SchemaFieldJson};
use crate::lowering::util::{parse_duration_seconds, parse_orientation};

/// Groups `schema.fields[]` by `source_id`, normalizing each field's type,
/// and attaches join metadata for sources that participate in the join.
/// Rejects any `source_id` that names neither a declared topic nor (when
/// `transform_enabled`) the transform output id.
pub fn build_streams(
    fields: &[SchemaFieldJson],
    topic_names: &[String],
    join: Option<&JoinJson>,
    transform_enabled: bool,
    transform_output_id: &str,
) -> Result<HashMap<String, SourceMapping>> {
    let mut streams: HashMap<String, SourceMapping> = HashMap::new();

    for field in fields {
        let valid_source = topic_names.iter().any(|t| t == &field.source_id)
            || (transform_enabled && field.source_id == transform_output_id);
        if !valid_source {
            return Err(ServiceError::unprocessable(format!(
                "schema field '{}' references unknown source_id '{}'",
                field.name, field.source_id
            ))
            .with_detail("field", field.name.clone())
            .with_detail("source_id", field.source_id.clone()));
        }

        let entry = streams.entry(field.source_id.clone()).or_default();
        entry.fields.push(SchemaField {
            name: field.name.clone(),
            field_type: normalize_to_basic_kafka_type(&field.field_type),
        });
    }

    if let Some(join) = join.filter(|j| j.enabled) {
        for source in &join.sources {
            let entry = streams.entry(source.source_id.clone()).or_default();
            entry.join_key_field = Some(source.join_key.clone());
            entry.join_orientation = Some(parse_orientation(&source.orientation)?);
            entry.join_window_seconds = Some(parse_duration_seconds(&source.window)?);
        }
    }

    Ok(streams)
}

/// Builds the sink's column mapping. Rows without both `column_name` and
/// `column_type` exist only to declare a field for validation/join-key
/// purposes and are dropped here. At least one column-producing row must
/// remain.
pub fn build_sink_mapping(
    fields: &[SchemaFieldJson],
    stream_name: &str,
) -> Result<Vec<SinkMappingRow>> {
    let rows: Vec<SinkMappingRow> = fields
        .iter()
        .filter_map(|f| {
            let column_name = f.column_name.as_ref()?;
            let column_type = f.column_type.as_ref()?;
            if column_name.is_empty() || column_type.is_empty() {
                return None;
            }
            Some(SinkMappingRow {
                stream_name: stream_name.to_string(),
                source_id: f.source_id.clone(),
                field_name: f.name.clone(),
                column_name: column_name.clone(),
                column_type: column_type.clone(),
            })
        })
        .collect();

    if rows.is_empty() {
        return Err(ServiceError::unprocessable(
            "at least one mapping row must declare both column_name and column_type",
        ));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lowering::pipeline_json::{JoinSourceJson, SchemaFieldJson};

    fn field(source_id: &str, name: &str, ty: &str, col: Option<&str>, col_ty: Option<&str>) -> SchemaFieldJson {
        SchemaFieldJson {
            source_id: source_id.to_string(),
            name: name.to_string(),
            field_type: ty.to_string(),
            column_name: col.map(str::to_string),
            column_type: col_ty.map(str::to_string),
        }
    }

    #[test]
    fn groups_fields_by_source_and_normalizes_types() {
        let fields = vec![
            field("users", "event_id", "String", None, None),
            field("users", "user_id", "string", Some("user_id"), Some("UUID")),
        ];
        let streams = build_streams(&fields, &["users".to_string()], None, false, "transform").unwrap();
        assert_eq!(streams["users"].fields.len(), 2);
        assert_eq!(streams["users"].fields[0].field_type, "string");
    }

    #[test]
    fn rejects_unknown_source_id() {
        let fields = vec![field("ghost", "x", "string", None, None)];
        let err = build_streams(&fields, &["users".to_string()], None, false, "transform").unwrap_err();
        assert!(matches!(err, ServiceError::Unprocessable { .. }));
    }

    #[test]
    fn allows_transform_output_id_when_transform_enabled() {
        let fields = vec![field("transform", "derived", "string", Some("derived"), Some("String"))];
        let streams = build_streams(&fields, &["users".to_string()], None, true, "transform").unwrap();
        assert!(streams.contains_key("transform"));
    }

    #[test]
    fn enriches_join_sources_with_key_and_window() {
        let fields = vec![field("events", "event_id", "string", None, None)];
        let join = JoinJson {
            enabled: true,
            join_type: "temporal".to_string(),
            sources: vec![JoinSourceJson {
                source_id: "events".to_string(),
                join_key: "event_id".to_string(),
                window: "1h".to_string(),
                orientation: "left".to_string(),
            }],
        };
        let streams =
            build_streams(&fields, &["events".to_string()], Some(&join), false, "transform").unwrap();
        let entry = &streams["events"];
        assert_eq!(entry.join_key_field.as_deref(), Some("event_id"));
        assert_eq!(entry.join_window_seconds, Some(3600));
    }

    #[test]
    fn drops_rows_without_column_metadata() {
        let fields = vec![
            field("users", "event_id", "string", None, None),
            field("users", "user_id", "string", Some("user_id"), Some("UUID")),
        ];
        let rows = build_sink_mapping(&fields, "stream").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].column_name, "user_id");
    }

    #[test]
    fn rejects_when_no_column_producing_row_remains() {
        let fields = vec![field("users", "event_id", "string", None, None)];
        assert!(build_sink_mapping(&fields, "stream").is_err());
    }
}
