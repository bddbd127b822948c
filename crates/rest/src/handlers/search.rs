//! Search interaction handler.
//!
//! `GET [base]/[type]?params`

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use ember_core::{FhirResponse, SearchParams};
use tracing::debug;

use crate::context::ServerContext;
use crate::error::RestResult;
use crate::handlers::resolve_service;
use crate::responses;

/// Handler for the search interaction.
///
/// Query parameters are passed to the service in request order; the
/// service returns a bundle-shaped payload.
pub async fn search_handler(
    State(context): State<ServerContext>,
    Path(resource_type): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
    req_headers: HeaderMap,
) -> RestResult<Response> {
    let service = resolve_service(&context, &resource_type)?;

    let params: SearchParams = query.into_iter().collect();
    debug!(
        resource_type = %resource_type,
        params = params.iter().count(),
        "Processing search request"
    );

    let bundle = service.search(&params).await?;
    let envelope = FhirResponse::ok(bundle);

    Ok(responses::render(envelope, &req_headers, context.base_url()))
}
