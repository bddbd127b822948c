//! The uniform result envelope returned by every handler operation.

use http::StatusCode;
use serde_json::Value;

use crate::key::ResourceKey;

/// Result of a single handler operation: a semantic HTTP status, the
/// identity of the affected resource (if any), and an optional payload.
///
/// The transport layer consumes the envelope exactly once to build the
/// outbound reply; envelopes are never mutated after construction. Whether
/// a response has a body is derived from the payload, never stored as a
/// separate flag.
#[derive(Debug, Clone)]
pub struct FhirResponse {
    /// Semantic HTTP status for the operation.
    pub status: StatusCode,
    /// Identity of the affected resource, when one was assigned.
    pub key: Option<ResourceKey>,
    /// Resource payload, when the operation produced one.
    pub resource: Option<Value>,
}

impl FhirResponse {
    /// Creates an envelope with the given status and no key or payload.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            key: None,
            resource: None,
        }
    }

    /// Attaches a resource identity.
    pub fn with_key(mut self, key: ResourceKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Attaches a payload.
    pub fn with_resource(mut self, resource: Value) -> Self {
        self.resource = Some(resource);
        self
    }

    /// `200 OK` with a payload.
    pub fn ok(resource: Value) -> Self {
        Self::new(StatusCode::OK).with_resource(resource)
    }

    /// `201 Created` with the new resource's identity and payload.
    pub fn created(key: ResourceKey, resource: Value) -> Self {
        Self::new(StatusCode::CREATED)
            .with_key(key)
            .with_resource(resource)
    }

    /// `204 No Content`, as returned by a successful delete.
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    /// Whether this envelope carries a payload.
    pub fn has_body(&self) -> bool {
        self.resource.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_has_body_is_derived() {
        assert!(!FhirResponse::new(StatusCode::OK).has_body());
        assert!(FhirResponse::ok(json!({"resourceType": "Patient"})).has_body());
        assert!(!FhirResponse::no_content().has_body());
    }

    #[test]
    fn test_created_carries_key_and_payload() {
        let key = ResourceKey::create_with_id("Patient", "1").unwrap();
        let response = FhirResponse::created(key.clone(), json!({"resourceType": "Patient"}));
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.key, Some(key));
        assert!(response.has_body());
    }
}
