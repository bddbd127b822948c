//! Error types for the core framework.
//!
//! The taxonomy splits into two fatality classes:
//!
//! - [`KeyError`] is recoverable and caller-correctable; the transport layer
//!   maps it to a 4xx response.
//! - [`RegistryError`] is fatal and startup-only. A registry scan that fails
//!   leaves the registry in an undefined state, so the host must abort
//!   before serving any traffic.

use thiserror::Error;

/// Errors produced by the resource identity model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// A URI string did not decompose into
    /// `{base}/{type}/{id}/_history/{version}`.
    #[error("malformed resource identity '{value}': {reason}")]
    MalformedIdentity {
        /// The string that failed to parse.
        value: String,
        /// Why it failed.
        reason: String,
    },

    /// A key was constructed or applied in an inconsistent way, for example
    /// a version id without a resource id, or an empty type name.
    #[error("invalid resource key: {message}")]
    InvalidKey {
        /// Description of the inconsistency.
        message: String,
    },
}

impl KeyError {
    pub(crate) fn malformed(value: impl Into<String>, reason: impl Into<String>) -> Self {
        KeyError::MalformedIdentity {
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        KeyError::InvalidKey {
            message: message.into(),
        }
    }
}

/// Fatal errors raised while building the capability registry at startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A module named in the configuration is not present in the catalog.
    #[error("handler module '{module}' not found; is it registered with the module catalog?")]
    ModuleNotFound {
        /// The configured module name.
        module: String,
    },

    /// A service constructor failed. The registry is left in an undefined
    /// state and must not be used.
    #[error("failed to initialize handler '{type_name}': {source}")]
    HandlerInitialization {
        /// The exported type whose constructor failed.
        type_name: String,
        /// The constructor's error.
        #[source]
        source: anyhow::Error,
    },

    /// Two handlers were registered for the same (capability, resource type)
    /// pair. Silent overwrite would hide a misconfiguration, so this is a
    /// hard error.
    #[error("duplicate {capability} handler for resource type '{resource_type}'")]
    DuplicateHandler {
        /// The capability kind both handlers claimed.
        capability: crate::registry::Capability,
        /// The resource type both handlers serve.
        resource_type: String,
    },
}
