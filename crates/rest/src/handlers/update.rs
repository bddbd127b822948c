//! Update interaction handler.
//!
//! `PUT [base]/[type]/[id]`

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use ember_core::ResourceKey;
use tracing::debug;

use crate::context::ServerContext;
use crate::error::{RestError, RestResult};
use crate::extractors::FhirBody;
use crate::handlers::resolve_service;
use crate::responses;

/// Handler for the update interaction.
///
/// The body's resourceType and id (when present) must agree with the URL;
/// the payload is validated before it reaches the service.
pub async fn update_handler(
    State(context): State<ServerContext>,
    Path((resource_type, id)): Path<(String, String)>,
    req_headers: HeaderMap,
    body: FhirBody,
) -> RestResult<Response> {
    let service = resolve_service(&context, &resource_type)?;

    debug!(resource_type = %resource_type, id = %id, "Processing update request");

    match body.resource_type() {
        Some(body_type) if body_type == resource_type => {}
        Some(body_type) => {
            return Err(RestError::BadRequest {
                message: format!(
                    "Resource type in body ({body_type}) does not match URL ({resource_type})"
                ),
            });
        }
        None => {
            return Err(RestError::BadRequest {
                message: "Resource must contain resourceType".to_string(),
            });
        }
    }

    if let Some(body_id) = body.0.get("id").and_then(|v| v.as_str())
        && body_id != id
    {
        return Err(RestError::BadRequest {
            message: format!("Resource id in body ({body_id}) does not match URL ({id})"),
        });
    }

    let resource = body.into_inner();
    let validation = context.validator().validate(&resource, None);
    if !validation.is_valid() {
        return Err(RestError::ValidationFailed { result: validation });
    }

    let key = ResourceKey::create_with_id(&resource_type, &id)?;
    let envelope = service.update(&key, resource).await?;

    Ok(responses::render(envelope, &req_headers, context.base_url()))
}
