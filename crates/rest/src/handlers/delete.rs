//! Delete interaction handler.
//!
//! `DELETE [base]/[type]/[id]`

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use ember_core::ResourceKey;
use tracing::debug;

use crate::context::ServerContext;
use crate::error::RestResult;
use crate::handlers::resolve_service;
use crate::responses;

/// Handler for the delete interaction.
pub async fn delete_handler(
    State(context): State<ServerContext>,
    Path((resource_type, id)): Path<(String, String)>,
    req_headers: HeaderMap,
) -> RestResult<Response> {
    let service = resolve_service(&context, &resource_type)?;

    debug!(resource_type = %resource_type, id = %id, "Processing delete request");

    let key = ResourceKey::create_with_id(&resource_type, &id)?;
    let envelope = service.delete(&key).await?;

    Ok(responses::render(envelope, &req_headers, context.base_url()))
}
