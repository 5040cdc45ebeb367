//! Thin HTTP surface over the pipeline: request decoding, status mapping,
//! CORS. No logic of its own.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::ai::OracleClient;
use crate::db::{self, ConnectionParams};
use crate::error::QueryLensError;
use crate::pipeline;

pub fn router(oracle: Arc<OracleClient>) -> Router {
    Router::new()
        .route("/api/query", post(handle_query))
        .route("/api/schema", post(handle_schema))
        .route("/api/test-connection", post(handle_test_connection))
        .route("/api/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(oracle)
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub config: ConnectionParams,
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct SchemaRequest {
    pub config: ConnectionParams,
}

async fn handle_query(
    State(oracle): State<Arc<OracleClient>>,
    Json(req): Json<QueryRequest>,
) -> Response {
    match pipeline::process_query(&req.config, &req.query, &oracle).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(e),
    }
}

async fn handle_schema(Json(req): Json<SchemaRequest>) -> Response {
    match pipeline::inspect_schema(&req.config).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(e),
    }
}

async fn handle_test_connection(Json(params): Json<ConnectionParams>) -> Response {
    match db::test_connection(&params).await {
        Ok(version) => Json(json!({"status": "ok", "version": version})).into_response(),
        Err(e) => error_response(e),
    }
}

async fn handle_health(State(oracle): State<Arc<OracleClient>>) -> Response {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "oracle_configured": oracle.is_configured(),
    }))
    .into_response()
}

fn error_response(e: QueryLensError) -> Response {
    error!("request failed: {}", e);
    let status = if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(json!({
            "detail": e.to_string(),
            "graph_generated": false,
        })),
    )
        .into_response()
}
