//! Request→Model lowering: turns an external `PipelineJson` into a
//! validated internal `PipelineConfig`, or the first validation error
//! encountered. Steps are numbered so a reviewer can walk them in order.

use chrono::Utc;

use crate::domain::clickhouse_types::is_supported_column_type;
use crate::domain::pipeline_config::*;
use crate::domain::status::PipelineStatus;
use crate::domain::streams;
use crate::error::{Result, ServiceError};
use crate::expression::ExpressionCompiler;
use crate::schema::resolver;

use super::pipeline_json::*;
pub use super::util::{parse_duration_seconds, parse_orientation};

pub const MIN_PIPELINE_ID_LENGTH: usize = 5;
pub const MAX_STREAMS_SUPPORTED_WITH_JOIN: usize = 2;

/// Lowers `json` into a fresh `PipelineConfig` in the `Created` status.
/// `compiler` is the black-box filter/transform expression compiler used to
/// validate any filter or transform expression before the pipeline is
/// persisted.
pub fn lower(json: PipelineJson, compiler: &dyn ExpressionCompiler) -> Result<PipelineConfig> {
    // Step 1: trim and validate pipeline_id.
    let pipeline_id = json.pipeline_id.trim().to_string();
    if pipeline_id.len() < MIN_PIPELINE_ID_LENGTH {
        return Err(ServiceError::unprocessable(format!(
            "pipeline_id must be at least {MIN_PIPELINE_ID_LENGTH} characters after trimming"
        )));
    }

    // Step 2: source type must be the Kafka ingestor tag.
    if json.source.source_type != KAFKA_SOURCE_TYPE {
        return Err(ServiceError::unprocessable(format!(
            "unsupported source type '{}'; only 'kafka' is supported",
            json.source.source_type
        )));
    }

    // Step 3: topic count and names.
    let topic_count = json.source.topics.len();
    if topic_count == 0 || topic_count > MAX_STREAMS_SUPPORTED_WITH_JOIN {
        return Err(ServiceError::unprocessable(format!(
            "topic count must be between 1 and {MAX_STREAMS_SUPPORTED_WITH_JOIN}, got {topic_count}"
        )));
    }
    for topic in &json.source.topics {
        if topic.name.trim().is_empty() {
            return Err(ServiceError::unprocessable("topic name must not be empty"));
        }
    }

    let transform_enabled = json
        .stateless_transformation
        .as_ref()
        .is_some_and(|t| t.enabled);
    let filter_enabled = json.filter.as_ref().is_some_and(|f| f.enabled);
    let join_enabled = json.join.as_ref().is_some_and(|j| j.enabled);
    let transform_output_id = "transform";

    // Step 4: lower the source.
    let connection = KafkaConnectionParams {
        brokers: json.source.connection_params.brokers.clone(),
        sasl_protocol: json.source.connection_params.sasl_protocol.clone(),
        sasl_mechanism: json.source.connection_params.sasl_mechanism.clone(),
        sasl_username: json.source.connection_params.sasl_username.clone(),
        sasl_password: json.source.connection_params.sasl_password.clone(),
        tls_enabled: json.source.connection_params.tls_enabled,
        tls_skip_verify: json.source.connection_params.tls_skip_verify,
        kerberos_service_name: json.source.connection_params.kerberos_service_name.clone(),
        kerberos_keytab: json.source.connection_params.kerberos_keytab.clone(),
        kerberos_principal: json.source.connection_params.kerberos_principal.clone(),
    };

    let consumer_group = streams::consumer_group(&pipeline_id);
    let mut topics = Vec::with_capacity(json.source.topics.len());
    for topic in &json.source.topics {
        let dedup = match &topic.deduplication {
            Some(d) if d.enabled => DeduplicationConfig {
                enabled: true,
                id_field: d.id_field.clone(),
                id_field_type: crate::domain::kafka_type::normalize_to_basic_kafka_type(
                    &d.id_field_type,
                ),
                time_window_seconds: parse_duration_seconds(&d.time_window)?,
            },
            _ => DeduplicationConfig::default(),
        };

        topics.push(KafkaTopicsConfig {
            name: topic.name.clone(),
            consumer_group: consumer_group.clone(),
            consumer_group_initial_offset: topic.consumer_group_initial_offset.clone(),
            replicas: topic.replicas,
            ingestor_stream: streams::ingestor_stream(&pipeline_id, &topic.name),
            dedup_output_stream: streams::dedup_output_stream(&pipeline_id, &topic.name),
            ingestor_consumer: streams::ingestor_consumer(&pipeline_id, &topic.name),
            dedup_consumer: streams::dedup_consumer(&pipeline_id, &topic.name),
            dedup,
        });
    }

    // Step 5: join component, iff enabled.
    let join = if join_enabled {
        let join_json = json.join.as_ref().unwrap();
        let mut sources = Vec::with_capacity(join_json.sources.len());
        for src in &join_json.sources {
            let topic = topics.iter().find(|t| t.name == src.source_id).ok_or_else(|| {
                ServiceError::unprocessable(format!(
                    "join source '{}' does not name a declared topic",
                    src.source_id
                ))
            })?;
            let input_stream = if topic.dedup.enabled || transform_enabled {
                topic.dedup_output_stream.clone()
            } else {
                topic.ingestor_stream.clone()
            };
            let orientation = parse_orientation(&src.orientation)?;
            let consumer_name = match orientation {
                JoinOrientation::Left => streams::join_left_consumer(&pipeline_id, &src.source_id),
                JoinOrientation::Right => streams::join_right_consumer(&pipeline_id, &src.source_id),
            };
            sources.push(JoinSourceConfig {
                source_id: src.source_id.clone(),
                join_key: src.join_key.clone(),
                window_seconds: parse_duration_seconds(&src.window)?,
                orientation,
                input_stream,
                consumer_name,
            });
        }
        Some(JoinConfig {
            enabled: true,
            join_type: join_json.join_type.clone(),
            sources,
            output_stream_id: streams::joined_stream(&pipeline_id),
        })
    } else {
        None
    };

    // Step 6: determine the sink's input stream.
    let sink_input_stream = if join_enabled {
        streams::joined_stream(&pipeline_id)
    } else if topics.len() == 1 {
        let topic = &topics[0];
        if topic.dedup.enabled || transform_enabled || filter_enabled {
            topic.dedup_output_stream.clone()
        } else {
            topic.ingestor_stream.clone()
        }
    } else {
        return Err(ServiceError::unprocessable(
            "a sink input stream requires either a join or exactly one source topic",
        ));
    };

    // Step 7: build the sink config.
    let max_delay_time_seconds = if json.sink.max_delay_time == 0 {
        SinkConfig::DEFAULT_MAX_DELAY_TIME_SECONDS
    } else {
        json.sink.max_delay_time
    };
    let sink = SinkConfig {
        host: json.sink.host.clone(),
        port: json.sink.port,
        http_port: json.sink.http_port,
        database: json.sink.database.clone(),
        username: json.sink.username.clone(),
        password: json.sink.password.clone(),
        table: json.sink.table.clone(),
        secure: json.sink.secure,
        skip_certificate_verification: json.sink.skip_certificate_verification,
        max_batch_size: json.sink.max_batch_size,
        max_delay_time_seconds,
        input_stream: sink_input_stream.clone(),
        consumer_name: streams::sink_consumer(&pipeline_id),
    };

    // Step 8: build the mapper config.
    let topic_names: Vec<String> = topics.iter().map(|t| t.name.clone()).collect();
    let sources = resolver::build_streams(
        &json.schema.fields,
        &topic_names,
        json.join.as_ref(),
        transform_enabled,
        transform_output_id,
    )?;
    let sink_mapping = resolver::build_sink_mapping(&json.schema.fields, &sink_input_stream)?;
    let mapper = MapperConfig { sources, sink_mapping };

    // Step 9: validate every column_type against the supported ClickHouse type set.
    for row in &mapper.sink_mapping {
        if !is_supported_column_type(&row.column_type) {
            return Err(ServiceError::unprocessable(format!(
                "unsupported ClickHouse column type '{}' for column '{}'",
                row.column_type, row.column_name
            ))
            .with_detail("column_name", row.column_name.clone())
            .with_detail("column_type", row.column_type.clone()));
        }
    }

    // Step 10: validate join keys against declared schema fields.
    if let Some(join_cfg) = &join {
        for src in &join_cfg.sources {
            let declared = mapper
                .sources
                .get(&src.source_id)
                .map(|s| s.fields.iter().any(|f| f.name == src.join_key))
                .unwrap_or(false);
            if !declared {
                return Err(ServiceError::unprocessable(format!(
                    "join key '{}' not found in schema for source '{}'",
                    src.join_key, src.source_id
                )));
            }
        }
    }

    // Step 11: validate dedup keys against declared schema fields.
    for topic in &topics {
        if topic.dedup.enabled && !topic.dedup.id_field.is_empty() {
            let declared = mapper
                .sources
                .get(&topic.name)
                .map(|s| s.fields.iter().any(|f| f.name == topic.dedup.id_field))
                .unwrap_or(false);
            if !declared {
                return Err(ServiceError::unprocessable(format!(
                    "deduplication key '{}' not found in schema for topic '{}'",
                    topic.dedup.id_field, topic.name
                )));
            }
        }
    }

    // Step 12: validate the filter expression.
    let filter = if let Some(filter_json) = &json.filter {
        if filter_json.enabled {
            if topics.len() != 1 {
                return Err(ServiceError::unprocessable(
                    "filtering supports only one source topic",
                ));
            }
            let source_fields = &mapper
                .sources
                .get(&topics[0].name)
                .map(|s| s.fields.clone())
                .unwrap_or_default();
            compiler
                .compile(&filter_json.expression, source_fields)
                .map_err(|diag| {
                    ServiceError::unprocessable(format!(
                        "filter expression invalid: {}",
                        diag.describe()
                    ))
                })?;
        }
        Some(FilterConfig { enabled: filter_json.enabled, expression: filter_json.expression.clone() })
    } else {
        None
    };

    // Step 13: validate transform expressions.
    let stateless_transform = if let Some(transform_json) = &json.stateless_transformation {
        if transform_json.enabled {
            let mut all_fields: Vec<_> =
                mapper.sources.values().flat_map(|s| s.fields.clone()).collect();
            all_fields.dedup_by(|a, b| a.name == b.name);
            for expr in &transform_json.config.transform {
                if !expr.expression.is_empty() {
                    compiler.compile(&expr.expression, &all_fields).map_err(|diag| {
                        ServiceError::unprocessable(format!(
                            "transform expression invalid: {}",
                            diag.describe()
                        ))
                    })?;
                }
            }
        }
        Some(TransformConfig {
            enabled: transform_json.enabled,
            transforms: transform_json
                .config
                .transform
                .iter()
                .map(|t| TransformExpression {
                    expression: t.expression.clone(),
                    output_name: t.output_name.clone(),
                    output_type: t.output_type.clone(),
                })
                .collect(),
        })
    } else {
        None
    };

    let now = Utc::now();
    Ok(PipelineConfig {
        version: PIPELINE_CONFIG_VERSION.to_string(),
        id: pipeline_id,
        name: json.name,
        metadata: json.metadata,
        status: PipelineStatus::Created,
        ingestor: IngestorConfig {
            kind: KAFKA_SOURCE_TYPE.to_string(),
            provider: json.source.provider,
            connection,
            topics,
        },
        join,
        filter,
        stateless_transform,
        sink,
        mapper,
        resources: None,
        created_at: now,
        updated_at: now,
    })
}

/// Reverses lowering: preserves id, name, topics, join, sink, filter,
/// transform, and mapping; internal-only names (consumer groups, stream
/// ids) are not part of the external document and are simply dropped.
pub fn to_pipeline_json(cfg: &PipelineConfig) -> PipelineJson {
    let topics = cfg
        .ingestor
        .topics
        .iter()
        .map(|t| TopicJson {
            name: t.name.clone(),
            consumer_group_initial_offset: t.consumer_group_initial_offset.clone(),
            replicas: t.replicas,
            deduplication: if t.dedup.enabled {
                Some(DeduplicationJson {
                    enabled: true,
                    id_field: t.dedup.id_field.clone(),
                    id_field_type: t.dedup.id_field_type.clone(),
                    time_window: format!("{}s", t.dedup.time_window_seconds),
                })
            } else {
                None
            },
            schema: None,
        })
        .collect();

    let join = cfg.join.as_ref().map(|j| JoinJson {
        enabled: j.enabled,
        join_type: j.join_type.clone(),
        sources: j
            .sources
            .iter()
            .map(|s| JoinSourceJson {
                source_id: s.source_id.clone(),
                join_key: s.join_key.clone(),
                window: format!("{}s", s.window_seconds),
                orientation: match s.orientation {
                    JoinOrientation::Left => "left".to_string(),
                    JoinOrientation::Right => "right".to_string(),
                },
            })
            .collect(),
    });

    let filter = cfg
        .filter
        .as_ref()
        .map(|f| FilterJson { enabled: f.enabled, expression: f.expression.clone() });

    let stateless_transformation = cfg.stateless_transform.as_ref().map(|t| StatelessTransformationJson {
        enabled: t.enabled,
        config: TransformationConfigJson {
            transform: t
                .transforms
                .iter()
                .map(|e| TransformExpressionJson {
                    expression: e.expression.clone(),
                    output_name: e.output_name.clone(),
                    output_type: e.output_type.clone(),
                })
                .collect(),
        },
    });

    let mut fields: Vec<SchemaFieldJson> = Vec::new();
    for (source_id, mapping) in &cfg.mapper.sources {
        for f in &mapping.fields {
            let column = cfg
                .mapper
                .sink_mapping
                .iter()
                .find(|r| r.source_id == *source_id && r.field_name == f.name);
            fields.push(SchemaFieldJson {
                source_id: source_id.clone(),
                name: f.name.clone(),
                field_type: f.field_type.clone(),
                column_name: column.map(|c| c.column_name.clone()),
                column_type: column.map(|c| c.column_type.clone()),
            });
        }
    }
    fields.sort_by(|a, b| (a.source_id.as_str(), a.name.as_str()).cmp(&(b.source_id.as_str(), b.name.as_str())));

    PipelineJson {
        pipeline_id: cfg.id.clone(),
        name: cfg.name.clone(),
        metadata: cfg.metadata.clone(),
        source: SourceJson {
            source_type: cfg.ingestor.kind.clone(),
            provider: cfg.ingestor.provider.clone(),
            connection_params: ConnectionParamsJson {
                brokers: cfg.ingestor.connection.brokers.clone(),
                sasl_protocol: cfg.ingestor.connection.sasl_protocol.clone(),
                sasl_mechanism: cfg.ingestor.connection.sasl_mechanism.clone(),
                sasl_username: cfg.ingestor.connection.sasl_username.clone(),
                sasl_password: cfg.ingestor.connection.sasl_password.clone(),
                tls_enabled: cfg.ingestor.connection.tls_enabled,
                tls_skip_verify: cfg.ingestor.connection.tls_skip_verify,
                kerberos_service_name: cfg.ingestor.connection.kerberos_service_name.clone(),
                kerberos_keytab: cfg.ingestor.connection.kerberos_keytab.clone(),
                kerberos_principal: cfg.ingestor.connection.kerberos_principal.clone(),
            },
            topics,
        },
        join,
        filter,
        stateless_transformation,
        sink: SinkJson {
            sink_type: "clickhouse".to_string(),
            host: cfg.sink.host.clone(),
            port: cfg.sink.port,
            http_port: cfg.sink.http_port,
            database: cfg.sink.database.clone(),
            username: cfg.sink.username.clone(),
            password: cfg.sink.password.clone(),
            table: cfg.sink.table.clone(),
            secure: cfg.sink.secure,
            skip_certificate_verification: cfg.sink.skip_certificate_verification,
            max_batch_size: cfg.sink.max_batch_size,
            max_delay_time: cfg.sink.max_delay_time_seconds,
            table_mapping: None,
        },
        schema: SchemaJson { fields },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::BlackBoxCompiler;

    fn base_json(id: &str, topics: Vec<TopicJson>) -> PipelineJson {
        PipelineJson {
            pipeline_id: id.to_string(),
            name: "demo".to_string(),
            metadata: Default::default(),
            source: SourceJson {
                source_type: KAFKA_SOURCE_TYPE.to_string(),
                provider: "confluent".to_string(),
                connection_params: ConnectionParamsJson { brokers: vec!["b:9092".into()], ..Default::default() },
                topics,
            },
            join: None,
            filter: None,
            stateless_transformation: None,
            sink: SinkJson {
                sink_type: "clickhouse".into(),
                host: "ch".into(),
                port: 9000,
                http_port: 8123,
                database: "default".into(),
                username: "default".into(),
                password: "".into(),
                table: "users_out".into(),
                secure: false,
                skip_certificate_verification: false,
                max_batch_size: 1000,
                max_delay_time: 0,
                table_mapping: None,
            },
            schema: SchemaJson {
                fields: vec![
                    SchemaFieldJson {
                        source_id: "users".into(),
                        name: "event_id".into(),
                        field_type: "string".into(),
                        column_name: None,
                        column_type: None,
                    },
                    SchemaFieldJson {
                        source_id: "users".into(),
                        name: "user_id".into(),
                        field_type: "string".into(),
                        column_name: Some("user_id".into()),
                        column_type: Some("UUID".into()),
                    },
                ],
            },
        }
    }

    fn topic(name: &str, dedup: Option<DeduplicationJson>) -> TopicJson {
        TopicJson {
            name: name.to_string(),
            consumer_group_initial_offset: "earliest".into(),
            replicas: 1,
            deduplication: dedup,
            schema: None,
        }
    }

    #[test]
    fn scenario_1_single_topic_dedup_no_join() {
        let json = base_json(
            "demo1",
            vec![topic(
                "users",
                Some(DeduplicationJson {
                    enabled: true,
                    id_field: "event_id".into(),
                    id_field_type: "string".into(),
                    time_window: "1h".into(),
                }),
            )],
        );
        let cfg = lower(json, &BlackBoxCompiler).unwrap();
        assert_eq!(cfg.sink.input_stream, streams::dedup_output_stream("demo1", "users"));
        assert_eq!(cfg.mapper.sink_mapping.len(), 1);
        assert_eq!(cfg.mapper.sink_mapping[0].column_type, "UUID");
        assert_eq!(cfg.status, PipelineStatus::Created);
    }

    #[test]
    fn scenario_3_filter_with_two_topics_is_rejected() {
        let mut json = base_json("demo3xx", vec![topic("events", None), topic("users", None)]);
        json.filter = Some(FilterJson { enabled: true, expression: "true".into() });
        let err = lower(json, &BlackBoxCompiler).unwrap_err();
        assert!(err.to_string().contains("filtering supports only one source topic"));
    }

    #[test]
    fn scenario_4_dedup_key_not_in_schema_is_rejected() {
        let json = base_json(
            "demo4xxx",
            vec![topic(
                "users",
                Some(DeduplicationJson {
                    enabled: true,
                    id_field: "nonexistent".into(),
                    id_field_type: "string".into(),
                    time_window: "1h".into(),
                }),
            )],
        );
        let err = lower(json, &BlackBoxCompiler).unwrap_err();
        assert!(err.to_string().contains("deduplication key 'nonexistent' not found"));
    }

    #[test]
    fn round_trip_preserves_id_name_topics_and_mapping() {
        let json = base_json(
            "demo-roundtrip",
            vec![topic(
                "users",
                Some(DeduplicationJson {
                    enabled: true,
                    id_field: "event_id".into(),
                    id_field_type: "string".into(),
                    time_window: "1h".into(),
                }),
            )],
        );
        let cfg = lower(json.clone(), &BlackBoxCompiler).unwrap();
        let round_tripped = to_pipeline_json(&cfg);
        assert_eq!(round_tripped.pipeline_id, json.pipeline_id);
        assert_eq!(round_tripped.name, json.name);
        assert_eq!(round_tripped.source.topics.len(), json.source.topics.len());
        assert_eq!(round_tripped.source.topics[0].name, "users");
        assert_eq!(
            round_tripped.source.topics[0].deduplication.as_ref().unwrap().id_field,
            "event_id"
        );
        let second = lower(round_tripped.clone(), &BlackBoxCompiler).unwrap();
        let second_json = to_pipeline_json(&second);
        assert_eq!(second_json.source.topics[0].name, round_tripped.source.topics[0].name);
    }
}
