//! HTTP transport: the REST API plus MCP streamable HTTP on one listener.
//!
//! REST handlers only unmarshal the request body, call the gateway and
//! marshal the outcome. Success bodies carry `"status": "success"` next to
//! the operation payload; failures carry `"status": "error"` and a `detail`.

use crate::error::GatewayError;
use crate::gateway::QueryGateway;
use crate::mcp::GatewayService;
use crate::models::{ExecuteSqlOutput, GenerateSqlOutput, QueryDatabaseOutput, SchemaOutput};
use crate::transport::{Transport, TransportError, TransportResult, wait_for_signal};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

/// SSE sessions can keep the server alive indefinitely after a signal.
const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpTransport {
    gateway: Arc<QueryGateway>,
    host: String,
    port: u16,
    /// MCP endpoint path
    endpoint: String,
}

impl HttpTransport {
    pub fn new(
        gateway: Arc<QueryGateway>,
        host: impl Into<String>,
        port: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            host: host.into(),
            port,
            endpoint: endpoint.into(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// REST routes with the MCP service mounted at the configured endpoint.
    pub fn router(&self) -> Router {
        let gateway = Arc::clone(&self.gateway);
        let mcp = StreamableHttpService::new(
            move || Ok(GatewayService::new(Arc::clone(&gateway))),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        // nest_service rejects "/", so a root endpoint catches whatever the
        // REST routes do not match.
        let app = api_router(Arc::clone(&self.gateway));
        if self.endpoint == "/" {
            app.fallback_service(mcp)
        } else {
            app.nest_service(&self.endpoint, mcp)
        }
    }
}

impl Transport for HttpTransport {
    async fn run(&self) -> TransportResult<()> {
        let bind_addr = self.bind_addr();
        info!(db_type = %self.gateway.db_type(), "Starting HTTP server on {}", bind_addr);

        let app = self.router();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: bind_addr.clone(),
                source,
            })?;

        info!(endpoint = %self.endpoint, "MCP endpoint ready");

        let shutdown_notify = Arc::new(tokio::sync::Notify::new());
        let notify = Arc::clone(&shutdown_notify);
        let shutdown_signal = async move {
            wait_for_signal().await;
            notify.notify_one();
        };

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

        tokio::select! {
            result = server => {
                match result {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => {
                        error!(error = %e, "HTTP server error");
                        return Err(TransportError::Serve {
                            transport: self.name(),
                            message: e.to_string(),
                        });
                    }
                }
            }
            _ = async {
                shutdown_notify.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for connections to close (send signal again to force exit)..."
                );
                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                        warn!("Graceful shutdown timeout, forcing exit");
                    }
                    _ = wait_for_signal() => {
                        warn!("Received second signal, forcing immediate exit");
                    }
                }
            } => {}
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

// =============================================================================
// REST API
// =============================================================================

/// The REST endpoints alone, with permissive CORS.
pub fn api_router(gateway: Arc<QueryGateway>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/test-db", get(test_db))
        .route("/schema", get(schema))
        .route("/query", post(query))
        .route("/sql", post(sql))
        .route("/generate-sql", post(generate_sql))
        .layer(CorsLayer::permissive())
        .with_state(gateway)
}

#[derive(Debug, Default, Deserialize)]
struct QuestionRequest {
    #[serde(default, alias = "query")]
    question: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SqlRequest {
    #[serde(default)]
    sql: Option<String>,
}

/// Error body: `{"status": "error", "detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    /// Input errors are the caller's fault; everything else is ours.
    fn from_gateway(context: &str, err: GatewayError) -> Self {
        match err {
            GatewayError::Input { message } => Self::bad_request(message),
            other => {
                warn!(kind = other.kind(), error = %other, "Request failed");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    detail: format!("{}: {}", context, other),
                }
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "status": "error", "detail": self.detail });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<JsonValue>, ApiError>;

/// Serialize `payload` and add `"status": "success"` in front of its fields.
fn success<T: Serialize>(payload: &T) -> ApiResult {
    let mut body = serde_json::Map::new();
    body.insert("status".to_string(), json!("success"));
    match serde_json::to_value(payload) {
        Ok(JsonValue::Object(fields)) => body.extend(fields),
        Ok(other) => {
            body.insert("data".to_string(), other);
        }
        Err(e) => {
            return Err(ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: format!("Failed to serialize response: {}", e),
            });
        }
    }
    Ok(Json(JsonValue::Object(body)))
}

/// A required body field that is absent, null or blank.
fn required(field: &str, value: Option<String>) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(format!("Missing '{}' field", field))),
    }
}

async fn root() -> Json<JsonValue> {
    Json(json!({
        "message": "NL2SQL API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Ask questions of a SQL database in natural language",
        "endpoints": {
            "/test-db": "Test database connection",
            "/query": "Process natural language query",
            "/schema": "Get database schema",
            "/sql": "Execute raw SQL query",
            "/generate-sql": "Generate SQL from natural language"
        }
    }))
}

async fn test_db(State(gateway): State<Arc<QueryGateway>>) -> Json<JsonValue> {
    match gateway.check_connection().await {
        Ok(()) => Json(json!({
            "status": "success",
            "message": format!("Connected to {} database!", gateway.db_type()),
        })),
        Err(e) => Json(json!({ "status": "error", "message": e.to_string() })),
    }
}

async fn schema(State(gateway): State<Arc<QueryGateway>>) -> ApiResult {
    let schema = gateway
        .get_schema()
        .await
        .map_err(|e| ApiError::from_gateway("Error getting schema", e))?;
    success(&SchemaOutput { schema })
}

async fn query(
    State(gateway): State<Arc<QueryGateway>>,
    payload: Result<Json<QuestionRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = payload?;
    let question = required("question", request.question)?;
    let answer = gateway
        .ask(&question)
        .await
        .map_err(|e| ApiError::from_gateway("Error processing query", e))?;
    success(&QueryDatabaseOutput::new(question, answer))
}

async fn sql(
    State(gateway): State<Arc<QueryGateway>>,
    payload: Result<Json<SqlRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = payload?;
    let sql_query = required("sql", request.sql)?;
    let result = gateway
        .execute_sql(&sql_query)
        .await
        .map_err(|e| ApiError::from_gateway("SQL execution error", e))?;
    success(&ExecuteSqlOutput { sql_query, result })
}

async fn generate_sql(
    State(gateway): State<Arc<QueryGateway>>,
    payload: Result<Json<QuestionRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = payload?;
    let question = required("question", request.question)?;
    let generated_sql = gateway
        .generate_sql(&question)
        .await
        .map_err(|e| ApiError::from_gateway("Error generating SQL", e))?;
    success(&GenerateSqlOutput {
        question,
        generated_sql,
    })
}
