use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use pipeline_control::expression::BlackBoxCompiler;
use pipeline_control::lowering::lower::lower;
use pipeline_control::lowering::pipeline_json::*;

fn single_topic_dedup_json(id: &str) -> PipelineJson {
    PipelineJson {
        pipeline_id: id.to_string(),
        name: "bench".to_string(),
        metadata: Default::default(),
        source: SourceJson {
            source_type: KAFKA_SOURCE_TYPE.to_string(),
            provider: "confluent".to_string(),
            connection_params: ConnectionParamsJson { brokers: vec!["b:9092".into()], ..Default::default() },
            topics: vec![TopicJson {
                name: "users".to_string(),
                consumer_group_initial_offset: "earliest".into(),
                replicas: 1,
                deduplication: Some(DeduplicationJson {
                    enabled: true,
                    id_field: "event_id".into(),
                    id_field_type: "string".into(),
                    time_window: "1h".into(),
                }),
                schema: None,
            }],
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

fn joined_two_topics_json(id: &str) -> PipelineJson {
    let mut json = single_topic_dedup_json(id);
    json.source.topics.push(TopicJson {
        name: "events".to_string(),
        consumer_group_initial_offset: "earliest".into(),
        replicas: 1,
        deduplication: Some(DeduplicationJson {
            enabled: true,
            id_field: "event_id".into(),
            id_field_type: "string".into(),
            time_window: "1h".into(),
        }),
        schema: None,
    });
    json.join = Some(JoinJson {
        enabled: true,
        join_type: "inner".into(),
        sources: vec![
            JoinSourceJson { source_id: "events".into(), join_key: "event_id".into(), window: "1h".into(), orientation: "left".into() },
            JoinSourceJson { source_id: "users".into(), join_key: "event_id".into(), window: "1h".into(), orientation: "right".into() },
        ],
    });
    json.schema.fields.push(SchemaFieldJson {
        source_id: "events".into(),
        name: "event_id".into(),
        field_type: "string".into(),
        column_name: Some("event_id".into()),
        column_type: Some("String".into()),
    });
    json
}

fn bench_lowering(c: &mut Criterion) {
    let compiler = BlackBoxCompiler;

    c.bench_function("lower_single_topic_dedup", |b| {
        b.iter_batched(
            || single_topic_dedup_json("bench-single"),
            |json| lower(black_box(json), &compiler).unwrap(),
            BatchSize::SmallInput,
        )
    });

    c.bench_function("lower_two_topic_join", |b| {
        b.iter_batched(
            || joined_two_topics_json("bench-join"),
            |json| lower(black_box(json), &compiler).unwrap(),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_lowering);
criterion_main!(benches);
