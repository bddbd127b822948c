//! Read interaction handler.
//!
//! `GET [base]/[type]/[id]`

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use ember_core::{FhirResponse, ResourceKey};
use http::StatusCode;
use tracing::debug;

use crate::context::ServerContext;
use crate::error::RestResult;
use crate::handlers::resolve_service;
use crate::responses;

/// Handler for the read interaction.
///
/// Returns the service's payload wrapped in a `200 OK` envelope, with
/// ETag/Last-Modified derived from the identity the resource carries.
pub async fn read_handler(
    State(context): State<ServerContext>,
    Path((resource_type, id)): Path<(String, String)>,
    req_headers: HeaderMap,
) -> RestResult<Response> {
    let service = resolve_service(&context, &resource_type)?;

    debug!(resource_type = %resource_type, id = %id, "Processing read request");

    let resource = service.read(&id).await?;
    let key = ResourceKey::from_resource(&resource, None)?;

    let mut envelope = FhirResponse::new(StatusCode::OK).with_resource(resource);
    if let Some(key) = key {
        envelope = envelope.with_key(key);
    }

    Ok(responses::render(envelope, &req_headers, context.base_url()))
}
