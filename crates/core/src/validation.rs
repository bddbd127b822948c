//! Profile validation binding.
//!
//! The validation engine itself is an external collaborator; this module
//! only defines the opaque engine trait and the single [`ProfileValidator`]
//! the host binds at startup, separately from the registry scan.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

/// A single finding from a validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Short machine-readable code.
    pub code: String,
    /// Human-readable detail.
    pub details: String,
}

/// Outcome of validating one resource against a profile.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// A result with no findings.
    pub fn valid() -> Self {
        Self::default()
    }

    /// A result carrying the given findings.
    pub fn with_issues(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// Whether validation passed (no findings).
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// The findings.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }
}

/// Opaque validation engine handle supplied by the host.
pub trait ValidationEngine: Send + Sync {
    /// Validates a resource, optionally against a named profile.
    fn validate(&self, resource: &Value, profile: Option<&str>) -> ValidationResult;
}

/// The one cross-cutting validator instance bound at startup.
///
/// Wraps the external engine and logs every run through the ambient
/// tracing subscriber.
pub struct ProfileValidator {
    engine: Arc<dyn ValidationEngine>,
}

impl ProfileValidator {
    /// Binds a validator to an engine handle.
    pub fn new(engine: Arc<dyn ValidationEngine>) -> Self {
        Self { engine }
    }

    /// Validates a resource and logs the outcome.
    pub fn validate(&self, resource: &Value, profile: Option<&str>) -> ValidationResult {
        let result = self.engine.validate(resource, profile);
        if result.is_valid() {
            debug!(profile = profile.unwrap_or("-"), "Resource validated");
        } else {
            warn!(
                profile = profile.unwrap_or("-"),
                issues = result.issues().len(),
                "Resource failed validation"
            );
        }
        result
    }
}

/// An engine that accepts everything. Useful for hosts that defer
/// validation to their handlers, and for tests.
#[derive(Debug, Default)]
pub struct AcceptAllEngine;

impl ValidationEngine for AcceptAllEngine {
    fn validate(&self, _resource: &Value, _profile: Option<&str>) -> ValidationResult {
        ValidationResult::valid()
    }
}
