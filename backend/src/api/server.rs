//! HTTP server exposing the conversions as triggers.
//!
//! # API Endpoints
//!
//! | Method   | Path                               | Description                         |
//! |----------|------------------------------------|-------------------------------------|
//! | GET      | `/health`                          | Health check                        |
//! | GET/POST | `/api/CsvToJson`                   | Delimited text to tabular JSON      |
//! | GET/POST | `/api/StandardizeJsonDataRequest`  | Data License response to field rows |
//! | GET      | `/api/logs`                        | SSE stream of conversion logs       |
//!
//! When a function key is configured, the two trigger endpoints require it in
//! the `code` query parameter or the `x-functions-key` header.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{sse::Event, sse::KeepAlive, Json, Response, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::Value;
use std::{convert::Infallible, env, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::logs::{log_info, log_warning, LogEntry, LOG_BROADCASTER};
use super::types::{
    conversion_response, health_payload, text_response, CsvToJsonRequestBody,
    MISSING_CONTENT_MESSAGE,
};
use crate::error::ServerResult;
use crate::transform::{convert, standardize};

/// Environment variable holding the function key.
pub const FUNCTION_KEY_ENV: &str = "RAPID_FUNCTION_KEY";

/// Header alternative to the `code` query parameter.
pub const FUNCTION_KEY_HEADER: &str = "x-functions-key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Required key for the trigger endpoints; `None` leaves them open.
    pub function_key: Option<String>,
}

impl ServerConfig {
    pub const DEFAULT_PORT: u16 = 7071;

    pub fn new(port: u16) -> Self {
        Self {
            port,
            function_key: None,
        }
    }

    /// Read the function key from the environment. Blank values are ignored.
    pub fn from_env(port: u16) -> Self {
        let function_key = env::var(FUNCTION_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());
        Self { port, function_key }
    }

    pub fn with_function_key(mut self, key: impl Into<String>) -> Self {
        self.function_key = Some(key.into());
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PORT)
    }
}

#[derive(Clone)]
struct AppState {
    config: Arc<ServerConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthQuery {
    code: Option<String>,
}

/// Build the application router.
pub fn router(config: ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/CsvToJson", get(csv_to_json_trigger).post(csv_to_json_trigger))
        .route(
            "/api/StandardizeJsonDataRequest",
            get(standardize_trigger).post(standardize_trigger),
        )
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server and serve until the process stops.
pub async fn start_server(config: ServerConfig) -> ServerResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let secured = config.function_key.is_some();
    let app = router(config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log_info(format!("Rapid server listening on http://{}", addr));
    log_info("   GET|POST /api/CsvToJson");
    log_info("   GET|POST /api/StandardizeJsonDataRequest");
    log_info("   GET      /api/logs");
    log_info("   GET      /health");
    if !secured {
        log_warning(format!("{} not set, trigger endpoints are open", FUNCTION_KEY_ENV));
    }

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(health_payload())
}

fn authorize(config: &ServerConfig, query: &AuthQuery, headers: &HeaderMap) -> Result<(), Response> {
    let Some(expected) = config.function_key.as_deref() else {
        return Ok(());
    };

    let supplied = query.code.as_deref().or_else(|| {
        headers
            .get(FUNCTION_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
    });

    match supplied {
        Some(key) if keys_match(key.as_bytes(), expected.as_bytes()) => Ok(()),
        _ => Err(text_response(StatusCode::UNAUTHORIZED, "Missing or invalid function key.")),
    }
}

/// Constant-time equality; only the length comparison short-circuits.
fn keys_match(supplied: &[u8], expected: &[u8]) -> bool {
    if supplied.len() != expected.len() {
        return false;
    }
    supplied
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

async fn csv_to_json_trigger(
    State(state): State<AppState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    LOG_BROADCASTER.log(LogEntry::info("Csv To Json conversion triggered").with_request(&request_id));

    if let Err(denied) = authorize(&state.config, &query, &headers) {
        LOG_BROADCASTER.log(LogEntry::warning("Rejected: bad function key").with_request(&request_id));
        return denied;
    }

    let body = if body.trim().is_empty() {
        CsvToJsonRequestBody::default()
    } else {
        match serde_json::from_str::<CsvToJsonRequestBody>(&body) {
            Ok(body) => body,
            Err(e) => {
                LOG_BROADCASTER.log(LogEntry::error(e.to_string()).with_request(&request_id));
                return text_response(StatusCode::BAD_REQUEST, e.to_string());
            }
        }
    };

    let request = body.into_request();
    if request.content.is_empty() {
        LOG_BROADCASTER.log(LogEntry::error(MISSING_CONTENT_MESSAGE).with_request(&request_id));
        return text_response(StatusCode::BAD_REQUEST, MISSING_CONTENT_MESSAGE);
    }

    conversion_response(convert(&request))
}

async fn standardize_trigger(
    State(state): State<AppState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    LOG_BROADCASTER
        .log(LogEntry::info("Standardize Json Data Request triggered").with_request(&request_id));

    if let Err(denied) = authorize(&state.config, &query, &headers) {
        LOG_BROADCASTER.log(LogEntry::warning("Rejected: bad function key").with_request(&request_id));
        return denied;
    }

    conversion_response(standardize(&body))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(LOG_BROADCASTER.subscribe()).filter_map(|entry| {
        let json = serde_json::to_string(&entry.ok()?).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
