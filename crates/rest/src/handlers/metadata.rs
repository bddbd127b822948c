//! Capabilities handler.
//!
//! `GET [base]/metadata`

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use chrono::Utc;
use ember_core::FhirResponse;
use serde_json::json;

use crate::context::ServerContext;
use crate::error::RestResult;
use crate::responses;

/// Interactions every registered handler serves.
const SUPPORTED_INTERACTIONS: [&str; 6] =
    ["create", "read", "search-type", "update", "patch", "delete"];

/// Handler for the capabilities interaction.
///
/// Returns a minimal CapabilityStatement listing the resource types the
/// registry has handlers for.
pub async fn metadata_handler(
    State(context): State<ServerContext>,
    req_headers: HeaderMap,
) -> RestResult<Response> {
    let resources: Vec<_> = context
        .registry()
        .resource_types()
        .into_iter()
        .map(|resource_type| {
            json!({
                "type": resource_type,
                "interaction": SUPPORTED_INTERACTIONS
                    .iter()
                    .map(|code| json!({ "code": code }))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    let statement = json!({
        "resourceType": "CapabilityStatement",
        "status": "active",
        "date": Utc::now().to_rfc3339(),
        "kind": "instance",
        "implementation": {
            "description": "Ember FHIR facade server",
            "url": context.base_url(),
        },
        "fhirVersion": "4.0.1",
        "format": [responses::FHIR_JSON],
        "rest": [{
            "mode": "server",
            "resource": resources,
        }],
    });

    let envelope = FhirResponse::ok(statement);
    Ok(responses::render(envelope, &req_headers, context.base_url()))
}
