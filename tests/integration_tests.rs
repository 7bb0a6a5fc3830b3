//! End-to-end coverage of the core create/edit/lifecycle/DLQ flows,
//! exercised against the real `axum::Router` via `tower::ServiceExt::oneshot`,
//! plus round-trip and state-machine checks that sit alongside them.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use pipeline_control::dlq::InMemoryDlqStore;
use pipeline_control::expression::BlackBoxCompiler;
use pipeline_control::http::{create_router, AppState};
use pipeline_control::service::{InMemoryPipelineStore, LocalOrchestrator, PipelineService};

fn test_app() -> axum::Router {
    let pipelines = PipelineService::new(
        InMemoryPipelineStore::new(),
        LocalOrchestrator,
        Arc::new(BlackBoxCompiler),
        100,
    );
    let state = AppState::new(Arc::new(pipelines), Arc::new(InMemoryDlqStore::new()), Arc::new(BlackBoxCompiler));
    create_router(state)
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, parsed)
}

fn demo1_body() -> Value {
    json!({
        "pipeline_id": "demo1",
        "name": "demo",
        "source": {
            "type": "kafka",
            "provider": "confluent",
            "connection_params": { "brokers": ["b:9092"] },
            "topics": [{
                "name": "users",
                "deduplication": { "enabled": true, "id_field": "event_id", "id_field_type": "string", "time_window": "1h" }
            }]
        },
        "sink": {
            "type": "clickhouse", "host": "ch", "port": 9000, "http_port": 8123,
            "database": "default", "username": "default", "password": "",
            "table": "users_out", "max_batch_size": 1000, "max_delay_time": 0
        },
        "schema": {
            "fields": [
                { "source_id": "users", "name": "event_id", "type": "string" },
                { "source_id": "users", "name": "user_id", "type": "string", "column_name": "user_id", "column_type": "UUID" }
            ]
        }
    })
}

#[tokio::test]
async fn scenario_1_create_single_topic_dedup_no_join() {
    let app = test_app();
    let (status, body) = send(&app, "POST", "/api/v1/pipeline", demo1_body()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "Created");
    assert_eq!(body["sink"]["input_stream"], "demo1.users.dedup");
    assert_eq!(body["mapper"]["sink_mapping"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn scenario_2_join_two_topics_both_dedup() {
    let app = test_app();
    let body = json!({
        "pipeline_id": "p2-join-demo",
        "name": "joined",
        "source": {
            "type": "kafka", "provider": "confluent",
            "connection_params": { "brokers": ["b:9092"] },
            "topics": [
                { "name": "events", "deduplication": { "enabled": true, "id_field": "event_id", "id_field_type": "string", "time_window": "1h" } },
                { "name": "users", "deduplication": { "enabled": true, "id_field": "event_id", "id_field_type": "string", "time_window": "24h" } }
            ]
        },
        "join": {
            "enabled": true, "type": "inner",
            "sources": [
                { "source_id": "events", "join_key": "event_id", "window": "1h", "orientation": "left" },
                { "source_id": "users", "join_key": "event_id", "window": "24h", "orientation": "right" }
            ]
        },
        "sink": {
            "type": "clickhouse", "host": "ch", "port": 9000, "http_port": 8123,
            "database": "default", "username": "default", "password": "",
            "table": "joined_out", "max_batch_size": 1000, "max_delay_time": 0
        },
        "schema": {
            "fields": [
                { "source_id": "events", "name": "event_id", "type": "string", "column_name": "event_id", "column_type": "String" },
                { "source_id": "users", "name": "event_id", "type": "string" }
            ]
        }
    });
    let (status, resp) = send(&app, "POST", "/api/v1/pipeline", body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp["sink"]["input_stream"], "p2-join-demo.joined");
    let join_sources = resp["join"]["sources"].as_array().unwrap();
    assert_eq!(join_sources[0]["input_stream"], "p2-join-demo.events.dedup");
    assert_eq!(join_sources[1]["input_stream"], "p2-join-demo.users.dedup");
}

#[tokio::test]
async fn scenario_3_reject_filter_with_two_topics() {
    let app = test_app();
    let mut body = demo1_body();
    body["pipeline_id"] = json!("demo3-filter");
    body["source"]["topics"]
        .as_array_mut()
        .unwrap()
        .push(json!({ "name": "other_topic" }));
    body["filter"] = json!({ "enabled": true, "expression": "true" });
    let (status, resp) = send(&app, "POST", "/api/v1/pipeline", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp["code"], "unprocessable_entity");
    assert!(resp["message"].as_str().unwrap().contains("filtering supports only one source topic"));
}

#[tokio::test]
async fn scenario_4_reject_dedup_key_not_in_schema() {
    let app = test_app();
    let mut body = demo1_body();
    body["pipeline_id"] = json!("demo4-dedup");
    body["source"]["topics"][0]["deduplication"]["id_field"] = json!("nonexistent");
    let (status, resp) = send(&app, "POST", "/api/v1/pipeline", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp["message"].as_str().unwrap().contains("deduplication key 'nonexistent' not found"));
}

#[tokio::test]
async fn scenario_5_edit_while_running_is_conflict() {
    let app = test_app();
    let mut body = demo1_body();
    body["pipeline_id"] = json!("demo5-edit");
    send(&app, "POST", "/api/v1/pipeline", body.clone()).await;
    send(&app, "POST", "/api/v1/pipeline/demo5-edit/stop", Value::Null).await;
    send(&app, "POST", "/api/v1/pipeline/demo5-edit/resume", Value::Null).await;

    let (status, resp) = send(&app, "POST", "/api/v1/pipeline/demo5-edit/edit", body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(resp["details"]["current_status"], "Running");
    assert_eq!(resp["details"]["requested_status"], "editing");
    assert_eq!(resp["details"]["valid_transitions"], json!(["Stopped"]));
}

#[tokio::test]
async fn scenario_6_dlq_purge_absent_is_not_found() {
    let app = test_app();
    let (status, resp) = send(&app, "POST", "/api/v1/pipeline/ghost-pipeline/dlq/purge", Value::Null).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp["code"], "not_found");
    assert!(resp["message"].as_str().unwrap().contains("dlq for pipeline_id"));
}

#[tokio::test]
async fn get_pipeline_rejects_unknown_schema_override_source() {
    let app = test_app();
    let mut body = demo1_body();
    body["pipeline_id"] = json!("demo-override");
    send(&app, "POST", "/api/v1/pipeline", body).await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/pipeline/demo-override?schema=nope:v1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn delete_requires_stopped_or_failed_over_http() {
    let app = test_app();
    let mut body = demo1_body();
    body["pipeline_id"] = json!("demo-delete");
    send(&app, "POST", "/api/v1/pipeline", body).await;

    let (status, _) = send(&app, "DELETE", "/api/v1/pipeline/demo-delete", Value::Null).await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(&app, "POST", "/api/v1/pipeline/demo-delete/stop", Value::Null).await;
    let (status, _) = send(&app, "DELETE", "/api/v1/pipeline/demo-delete", Value::Null).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn round_trip_through_create_then_edit_preserves_shape() {
    let app = test_app();
    let mut body = demo1_body();
    body["pipeline_id"] = json!("demo-roundtrip-http");
    let (_, created) = send(&app, "POST", "/api/v1/pipeline", body).await;
    assert_eq!(created["mapper"]["sink_mapping"][0]["column_type"], "UUID");

    send(&app, "POST", "/api/v1/pipeline/demo-roundtrip-http/stop", Value::Null).await;
    let mut edit_body = demo1_body();
    edit_body["pipeline_id"] = json!("demo-roundtrip-http");
    let (status, edited) = send(&app, "POST", "/api/v1/pipeline/demo-roundtrip-http/edit", edit_body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["id"], "demo-roundtrip-http");
    assert_eq!(edited["status"], "Stopped");
}

#[tokio::test]
async fn healthz_and_platform_are_reachable() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/api/v1/healthz", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, "GET", "/api/v1/platform", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orchestrator"], "local");
}
