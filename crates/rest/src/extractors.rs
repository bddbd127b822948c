//! Request extractors.
//!
//! [`FhirBody`] pulls a JSON resource out of the request body, running
//! gzip-encoded bodies through the bounded decompression transform first.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use http::header;
use serde_json::Value;

use crate::compression::{GZIP_ENCODING, gunzip_bytes};
use crate::context::ServerContext;
use crate::error::RestError;

/// Extractor for a JSON resource payload.
///
/// - Rejects non-JSON content types with 415.
/// - Decompresses `Content-Encoding: gzip` bodies under the configured
///   ceiling; a body that would exceed it is rejected with 413 before it
///   is materialized.
/// - Rejects unparseable JSON with 400.
#[derive(Debug)]
pub struct FhirBody(pub Value);

impl FhirBody {
    /// Returns the payload's resource type, if declared.
    pub fn resource_type(&self) -> Option<&str> {
        self.0.get("resourceType").and_then(Value::as_str)
    }

    /// Consumes the extractor and returns the inner value.
    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl FromRequest<ServerContext> for FhirBody {
    type Rejection = RestError;

    async fn from_request(req: Request, state: &ServerContext) -> Result<Self, Self::Rejection> {
        if let Some(content_type) = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            && !is_json_content_type(content_type)
        {
            return Err(RestError::UnsupportedMediaType {
                content_type: content_type.to_string(),
            });
        }

        let gzipped = req
            .headers()
            .get(header::CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(GZIP_ENCODING));

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| RestError::BadRequest {
                message: format!("failed to read request body: {e}"),
            })?;

        let bytes = if gzipped {
            gunzip_bytes(&bytes, state.config().decompression_limit())?.into()
        } else {
            bytes
        };

        let value: Value = serde_json::from_slice(&bytes).map_err(|e| RestError::BadRequest {
            message: format!("invalid JSON: {e}"),
        })?;

        Ok(FhirBody(value))
    }
}

/// Accepts `application/fhir+json`, `application/json`, and any `+json`
/// structured syntax.
fn is_json_content_type(content_type: &str) -> bool {
    let Ok(mime) = content_type.parse::<mime::Mime>() else {
        return false;
    };
    mime.type_() == mime::APPLICATION
        && (mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_content_types() {
        assert!(is_json_content_type("application/fhir+json"));
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(!is_json_content_type("application/fhir+xml"));
        assert!(!is_json_content_type("text/plain"));
        assert!(!is_json_content_type("not a mime type"));
    }
}
