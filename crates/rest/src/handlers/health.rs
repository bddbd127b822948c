//! Health check handler.
//!
//! `GET [base]/health`

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::context::ServerContext;

/// Handler for the health check endpoint.
///
/// Reports liveness plus the number of registered handlers, so an
/// orchestrator can tell an empty registry from a healthy one.
pub async fn health_handler(State(context): State<ServerContext>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "handlers": context.registry().len(),
        "resourceTypes": context.registry().resource_types(),
    }))
}
