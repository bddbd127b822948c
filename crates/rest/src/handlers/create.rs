//! Create interaction handler.
//!
//! `POST [base]/[type]`

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

/// Handler for the create interaction.
///
/// The resource type in the body must match the URL; the payload is run
/// through the bound profile validator before it reaches the service. The
/// service assigns the id and returns the final identity on its envelope.
///
/// # Response
///
/// - `201 Created` - Resource created (Location/ETag from the envelope key)
/// - `400 Bad Request` - Body/URL type mismatch or missing resourceType
/// - `404 Not Found` - No handler registered for the type
/// - `422 Unprocessable Entity` - Profile validation failed
pub async fn create_handler(
    State(context): State<ServerContext>,
    Path(resource_type): Path<String>,
    req_headers: HeaderMap,
    body: FhirBody,
) -> RestResult<Response> {
    let service = resolve_service(&context, &resource_type)?;

    debug!(resource_type = %resource_type, "Processing create request");

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

    let resource = body.into_inner();
    let validation = context.validator().validate(&resource, None);
    if !validation.is_valid() {
        return Err(RestError::ValidationFailed { result: validation });
    }

    let key = ResourceKey::create(&resource_type)?;
    let envelope = service.create(&key, resource).await?;

    Ok(responses::render(envelope, &req_headers, context.base_url()))
}
