//! REST API behavior through the axum router, without a listener.

mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use common::{StubDatabase, StubModel, gateway, table_t};
use nl2sql_mcp_server::transport::api_router;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn app(db: Arc<StubDatabase>, model: Arc<StubModel>) -> axum::Router {
    api_router(Arc::new(gateway(db, model)))
}

fn default_app() -> axum::Router {
    app(
        Arc::new(StubDatabase::new().with_table("t", table_t())),
        Arc::new(StubModel::replying("```sql\nSELECT * FROM t\n```")),
    )
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let (status, body) = send(default_app(), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    for path in ["/test-db", "/query", "/schema", "/sql", "/generate-sql"] {
        assert!(body["endpoints"].get(path).is_some(), "missing {}", path);
    }
}

#[tokio::test]
async fn test_query_returns_sql_and_rows() {
    let (status, body) = send(
        default_app(),
        post_json("/query", json!({ "question": "list all rows in t" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["question"], "list all rows in t");
    assert_eq!(body["generated_sql"], "SELECT * FROM t");
    assert_eq!(body["result"]["row_count"], 2);
    assert_eq!(body["result"]["rows"][0]["name"], "alice");
}

#[tokio::test]
async fn test_query_accepts_query_field() {
    let (status, body) = send(
        default_app(),
        post_json("/query", json!({ "query": "list all rows in t" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["generated_sql"], "SELECT * FROM t");
}

#[tokio::test]
async fn test_query_missing_question_is_400_without_model_call() {
    let model = Arc::new(StubModel::replying("SELECT 1"));
    let db = Arc::new(StubDatabase::new());
    let (status, body) = send(
        app(Arc::clone(&db), Arc::clone(&model)),
        post_json("/query", json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["detail"], "Missing 'question' field");
    assert_eq!(model.call_count(), 0);
    assert_eq!(db.connect_count(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/sql")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(default_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_sql_runs_select() {
    let (status, body) = send(
        default_app(),
        post_json("/sql", json!({ "sql": "SELECT * FROM t" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sql_query"], "SELECT * FROM t");
    assert_eq!(body["result"]["columns"], json!(["id", "name"]));
}

#[tokio::test]
async fn test_sql_policy_rejection_is_500() {
    let db = Arc::new(StubDatabase::new().with_table("t", table_t()));
    let (status, body) = send(
        app(Arc::clone(&db), Arc::new(StubModel::replying(""))),
        post_json("/sql", json!({ "sql": "DROP TABLE t" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert!(body["detail"].as_str().unwrap().contains("Only SELECT queries are allowed"));
    assert_eq!(db.connect_count(), 0);
}

#[tokio::test]
async fn test_sql_missing_field_is_400() {
    let (status, body) = send(default_app(), post_json("/sql", json!({ "sql": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Missing 'sql' field");
}

#[tokio::test]
async fn test_generate_sql_does_not_execute() {
    let db = Arc::new(StubDatabase::new().with_table("t", table_t()));
    let (status, body) = send(
        app(Arc::clone(&db), Arc::new(StubModel::replying("SELECT name FROM t"))),
        post_json("/generate-sql", json!({ "question": "names?" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["question"], "names?");
    assert_eq!(body["generated_sql"], "SELECT name FROM t");
    assert_eq!(db.fetch_count(), 0);
}

#[tokio::test]
async fn test_schema_endpoint() {
    let (status, body) = send(default_app(), get("/schema")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["schema"]["t"]["columns"][1]["declared_type"], "varchar(50)");
    assert_eq!(body["schema"]["t"]["sample_rows"][0]["id"], 1);
}

#[tokio::test]
async fn test_db_check_reports_success_and_error() {
    let (status, body) = send(default_app(), get("/test-db")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let down = app(
        Arc::new(StubDatabase::unreachable("connection refused")),
        Arc::new(StubModel::replying("")),
    );
    let (status, body) = send(down, get("/test-db")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_unreachable_database_on_query_is_500() {
    let down = app(
        Arc::new(StubDatabase::unreachable("connection refused")),
        Arc::new(StubModel::replying("SELECT 1")),
    );
    let (status, body) = send(down, post_json("/query", json!({ "question": "anything" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().starts_with("Error processing query"));
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let request = Request::builder()
        .uri("/")
        .header(header::ORIGIN, "http://example.com")
        .body(Body::empty())
        .unwrap();
    let response = default_app().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}
