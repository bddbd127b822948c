//! Error types for the transport layer.
//!
//! Every error is converted into a FHIR OperationOutcome response with an
//! appropriate HTTP status code and issue code:
//!
//! | Error | HTTP Status | Issue Code |
//! |-------|-------------|------------|
//! | NoHandler | 404 | not-found |
//! | NotFound | 404 | not-found |
//! | BadRequest | 400 | invalid |
//! | ValidationFailed | 422 | processing |
//! | UnprocessableEntity | 422 | processing |
//! | UnsupportedMediaType | 415 | not-supported |
//! | PayloadTooLarge | 413 | too-long |
//! | InternalError | 500 | exception |

use axum::Json;
use axum::response::{IntoResponse, Response};
use ember_core::{KeyError, ServiceError, ValidationResult};
use http::StatusCode;
use thiserror::Error;

use crate::compression::TransformError;
use crate::responses::{IssueSeverity, operation_outcome, validation_outcome};

/// The primary error type for transport-layer operations.
#[derive(Debug, Error)]
pub enum RestError {
    /// No module registered a handler for this resource type (HTTP 404).
    #[error("no handler registered for resource type '{resource_type}'")]
    NoHandler {
        /// The requested resource type.
        resource_type: String,
    },

    /// Resource not found (HTTP 404).
    #[error("resource not found: {resource_type}/{id}")]
    NotFound {
        /// The resource type.
        resource_type: String,
        /// The resource id.
        id: String,
    },

    /// Bad request - malformed identity, key misuse, or invalid content
    /// (HTTP 400).
    #[error("bad request: {message}")]
    BadRequest {
        /// Error message.
        message: String,
    },

    /// The resource failed profile validation (HTTP 422).
    #[error("resource failed validation")]
    ValidationFailed {
        /// The validation findings.
        result: ValidationResult,
    },

    /// Unprocessable entity - semantic error (HTTP 422).
    #[error("unprocessable entity: {message}")]
    UnprocessableEntity {
        /// Error message.
        message: String,
    },

    /// Unsupported media type (HTTP 415).
    #[error("unsupported media type: {content_type}")]
    UnsupportedMediaType {
        /// The unsupported content type.
        content_type: String,
    },

    /// Decompressed request body exceeded the configured ceiling
    /// (HTTP 413).
    #[error("decompressed payload exceeds the configured maximum of {limit} bytes")]
    PayloadTooLarge {
        /// The configured ceiling in bytes.
        limit: u64,
    },

    /// Internal server error (HTTP 500).
    #[error("internal error: {message}")]
    InternalError {
        /// Error message.
        message: String,
    },
}

/// Result type for transport-layer operations.
pub type RestResult<T> = Result<T, RestError>;

impl From<KeyError> for RestError {
    fn from(e: KeyError) -> Self {
        RestError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<ServiceError> for RestError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound { type_name, id } => RestError::NotFound {
                resource_type: type_name,
                id,
            },
            ServiceError::Invalid { message } => RestError::BadRequest { message },
            ServiceError::Processing { message } => RestError::UnprocessableEntity { message },
        }
    }
}

impl From<TransformError> for RestError {
    fn from(e: TransformError) -> Self {
        match e {
            TransformError::PayloadTooLarge { limit } => RestError::PayloadTooLarge { limit },
            TransformError::CorruptStream { source } => RestError::BadRequest {
                message: format!("corrupt compressed request body: {source}"),
            },
            TransformError::Io(e) => RestError::InternalError {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        if let RestError::ValidationFailed { result } = &self {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(validation_outcome(result)),
            )
                .into_response();
        }

        let (status, code, details) = match &self {
            RestError::NoHandler { resource_type } => (
                StatusCode::NOT_FOUND,
                "not-found",
                format!("No handler registered for resource type '{resource_type}'"),
            ),
            RestError::NotFound { resource_type, id } => (
                StatusCode::NOT_FOUND,
                "not-found",
                format!("Resource {resource_type}/{id} not found"),
            ),
            RestError::BadRequest { message } => {
                (StatusCode::BAD_REQUEST, "invalid", message.clone())
            }
            RestError::ValidationFailed { .. } => unreachable!("handled above"),
            RestError::UnprocessableEntity { message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "processing",
                message.clone(),
            ),
            RestError::UnsupportedMediaType { content_type } => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "not-supported",
                format!("Content type '{content_type}' is not supported"),
            ),
            RestError::PayloadTooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "too-long",
                format!("Decompressed payload exceeds the configured maximum of {limit} bytes"),
            ),
            RestError::InternalError { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "exception",
                message.clone(),
            ),
        };

        let outcome = operation_outcome(IssueSeverity::Error, code, &details);
        (status, Json(outcome)).into_response()
    }
}
