//! FHIR route configuration.
//!
//! Maps HTTP paths to the interaction handlers.

use axum::Router;
use axum::routing::{delete, get, patch, post, put};

use crate::context::ServerContext;
use crate::handlers;

/// Creates all routes served by the transport layer.
///
/// # Routes
///
/// ## System-level
/// - `GET /metadata` - CapabilityStatement
/// - `GET /health` - Health check
///
/// ## Type-level
/// - `GET /{type}` - Search
/// - `POST /{type}` - Create
///
/// ## Instance-level
/// - `GET /{type}/{id}` - Read
/// - `PUT /{type}/{id}` - Update
/// - `PATCH /{type}/{id}` - Patch
/// - `DELETE /{type}/{id}` - Delete
pub fn create_routes(context: ServerContext) -> Router {
    Router::new()
        // System-level routes
        .route("/metadata", get(handlers::metadata_handler))
        .route("/health", get(handlers::health_handler))
        // Type-level routes
        .route("/{resource_type}", get(handlers::search_handler))
        .route("/{resource_type}", post(handlers::create_handler))
        // Instance-level routes
        .route("/{resource_type}/{id}", get(handlers::read_handler))
        .route("/{resource_type}/{id}", put(handlers::update_handler))
        .route("/{resource_type}/{id}", patch(handlers::patch_handler))
        .route("/{resource_type}/{id}", delete(handlers::delete_handler))
        // State
        .with_state(context)
}
