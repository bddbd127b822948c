//! Patch interaction handler.
//!
//! `PATCH [base]/[type]/[id]`

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use ember_core::ResourceKey;
use tracing::debug;

use crate::context::ServerContext;
use crate::error::RestResult;
use crate::extractors::FhirBody;
use crate::handlers::resolve_service;
use crate::responses;

/// Handler for the patch interaction.
///
/// The body is a patch document, not a resource, so no resourceType check
/// applies; interpreting the document is the service's business.
pub async fn patch_handler(
    State(context): State<ServerContext>,
    Path((resource_type, id)): Path<(String, String)>,
    req_headers: HeaderMap,
    body: FhirBody,
) -> RestResult<Response> {
    let service = resolve_service(&context, &resource_type)?;

    debug!(resource_type = %resource_type, id = %id, "Processing patch request");

    let key = ResourceKey::create_with_id(&resource_type, &id)?;
    let envelope = service.patch(&key, body.into_inner()).await?;

    Ok(responses::render(envelope, &req_headers, context.base_url()))
}
