//! Response formatting.
//!
//! Converts a handler's [`FhirResponse`] envelope into an HTTP reply: the
//! envelope's status, a JSON body when one is present, `Location`/`ETag`/
//! `Last-Modified` headers derived from the key and payload, and gzip
//! transfer encoding when the client asked for it.

pub mod operation_outcome;

pub use operation_outcome::{IssueSeverity, operation_outcome, validation_outcome};

use axum::body::Body;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, FixedOffset};
use ember_core::{FhirResponse, ResourceKey};
use http::header::{self, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde_json::Value;
use tracing::warn;

use crate::compression::{GZIP_ENCODING, gzip_bytes};

/// MIME type for FHIR JSON.
pub const FHIR_JSON: &str = "application/fhir+json";

/// Renders an envelope into an HTTP response.
///
/// `request_headers` supplies `Accept-Encoding` for the compression
/// decision; `base_url` anchors relative keys in the `Location` header.
pub fn render(envelope: FhirResponse, request_headers: &HeaderMap, base_url: &str) -> Response {
    let mut builder = Response::builder().status(envelope.status);

    if let Some(key) = &envelope.key {
        // Location announces a newly created resource; other interactions
        // only carry the version tag.
        if envelope.status == StatusCode::CREATED
            && let Ok(location) = HeaderValue::from_str(&location_for(key, base_url))
        {
            builder = builder.header(header::LOCATION, location);
        }
        if let Some(version) = key.version_id()
            && let Ok(etag) = HeaderValue::from_str(&format!("W/\"{version}\""))
        {
            builder = builder.header(header::ETAG, etag);
        }
    }

    if let Some(last_modified) = envelope.resource.as_ref().and_then(last_modified_header) {
        builder = builder.header(header::LAST_MODIFIED, last_modified);
    }

    let Some(resource) = envelope.resource else {
        return builder
            .body(Body::empty())
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    };

    let bytes = match serde_json::to_vec(&resource) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Failed to serialize response payload");
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::empty())
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response());
        }
    };

    builder = builder.header(header::CONTENT_TYPE, HeaderValue::from_static(FHIR_JSON));

    let body = if accepts_gzip(request_headers) {
        match gzip_bytes(&bytes) {
            Ok(compressed) => {
                builder = builder.header(
                    header::CONTENT_ENCODING,
                    HeaderValue::from_static(GZIP_ENCODING),
                );
                compressed
            }
            Err(e) => {
                // Fall back to the identity encoding; the payload is intact.
                warn!(error = %e, "Response compression failed");
                bytes
            }
        }
    } else {
        bytes
    };

    builder
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Whether the client advertised gzip support.
fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            v.split(',')
                .any(|token| token.trim().split(';').next() == Some(GZIP_ENCODING))
        })
}

/// Absolute URI for the `Location` header: the key's own base when it has
/// one, otherwise the server's.
fn location_for(key: &ResourceKey, base_url: &str) -> String {
    if key.base().is_some() {
        key.to_uri_string()
    } else {
        key.clone().with_base(base_url).to_uri_string()
    }
}

/// Derives `Last-Modified` from the payload's `meta.lastUpdated`, when it
/// parses as an RFC 3339 instant.
fn last_modified_header(resource: &Value) -> Option<HeaderValue> {
    let last_updated = resource
        .get("meta")
        .and_then(|meta| meta.get("lastUpdated"))
        .and_then(Value::as_str)?;
    let instant: DateTime<FixedOffset> = last_updated.parse().ok()?;
    HeaderValue::from_str(&instant.to_utc().format("%a, %d %b %Y %H:%M:%S GMT").to_string()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_sets_location_and_etag() {
        let key = ResourceKey::create_versioned("Patient", "42", "3").unwrap();
        let envelope = FhirResponse::created(key, json!({"resourceType": "Patient", "id": "42"}));
        let response = render(envelope, &HeaderMap::new(), "http://localhost:8080");

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "http://localhost:8080/Patient/42/_history/3"
        );
        assert_eq!(response.headers().get(header::ETAG).unwrap(), "W/\"3\"");
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), FHIR_JSON);
    }

    #[test]
    fn test_render_no_body_has_no_content_type() {
        let envelope = FhirResponse::no_content();
        let response = render(envelope, &HeaderMap::new(), "http://localhost:8080");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_render_compresses_when_accepted() {
        let mut request_headers = HeaderMap::new();
        request_headers.insert(
            header::ACCEPT_ENCODING,
            HeaderValue::from_static("gzip, deflate"),
        );
        let envelope = FhirResponse::ok(json!({"resourceType": "Patient"}));
        let response = render(envelope, &request_headers, "http://localhost:8080");
        assert_eq!(
            response.headers().get(header::CONTENT_ENCODING).unwrap(),
            GZIP_ENCODING
        );
    }

    #[test]
    fn test_last_modified_from_meta() {
        let resource = json!({
            "resourceType": "Patient",
            "meta": { "lastUpdated": "2024-03-01T12:30:45Z" }
        });
        let value = last_modified_header(&resource).unwrap();
        assert_eq!(value, "Fri, 01 Mar 2024 12:30:45 GMT");
    }

    #[test]
    fn test_accepts_gzip_parsing() {
        let mut headers = HeaderMap::new();
        assert!(!accepts_gzip(&headers));

        headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("br, gzip;q=0.8"));
        assert!(accepts_gzip(&headers));

        headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        assert!(!accepts_gzip(&headers));
    }
}
