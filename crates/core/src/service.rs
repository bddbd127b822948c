//! The handler capability interface.
//!
//! A handler module contributes one [`FhirService`] implementation per
//! resource type it serves. The hosting transport layer resolves an
//! implementation through the capability registry and invokes exactly one
//! operation per inbound request; implementations must therefore be safe
//! for concurrent shared use and bring their own concurrency control if
//! they share state across requests.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::key::ResourceKey;
use crate::response::FhirResponse;

/// Errors a handler operation may surface across the transport boundary.
///
/// Each variant maps to a client-facing OperationOutcome response; none of
/// them is process-fatal.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The addressed resource does not exist (HTTP 404).
    #[error("{type_name}/{id} not found")]
    NotFound {
        /// The resource type.
        type_name: String,
        /// The resource id.
        id: String,
    },

    /// The request content is invalid (HTTP 400).
    #[error("invalid request: {message}")]
    Invalid {
        /// Description of the problem.
        message: String,
    },

    /// The request was well-formed but could not be processed (HTTP 422).
    #[error("processing failed: {message}")]
    Processing {
        /// Description of the failure.
        message: String,
    },
}

/// Result type for handler operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Search parameters from the request query string, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams(Vec<(String, String)>);

impl SearchParams {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Returns the first value for a parameter name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over all `(name, value)` pairs in request order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Whether no parameters were supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for SearchParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Operations a handler must implement to serve a resource type.
///
/// `resource_type` is the handler's self-identification: the registry keys
/// the instance under the type name it reports. Every mutating operation
/// receives the identity the transport derived from the request URI and
/// returns a [`FhirResponse`] envelope; reads return the bare payload and
/// let the transport wrap it.
#[async_trait]
pub trait FhirService: Send + Sync {
    /// The resource type this handler serves, e.g. `"Patient"`.
    fn resource_type(&self) -> &str;

    /// Creates a new resource. The handler assigns the id and returns the
    /// final identity on the envelope.
    async fn create(&self, key: &ResourceKey, resource: Value) -> ServiceResult<FhirResponse>;

    /// Reads a resource by id.
    async fn read(&self, id: &str) -> ServiceResult<Value>;

    /// Searches this resource type, returning a bundle-shaped payload.
    async fn search(&self, params: &SearchParams) -> ServiceResult<Value>;

    /// Updates the resource addressed by `key`.
    async fn update(&self, key: &ResourceKey, resource: Value) -> ServiceResult<FhirResponse>;

    /// Deletes the resource addressed by `key`.
    async fn delete(&self, key: &ResourceKey) -> ServiceResult<FhirResponse>;

    /// Applies a patch document to the resource addressed by `key`.
    async fn patch(&self, key: &ResourceKey, patch: Value) -> ServiceResult<FhirResponse>;
}
