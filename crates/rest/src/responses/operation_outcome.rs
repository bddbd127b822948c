//! OperationOutcome response generation.
//!
//! Every failure surfaced across the transport boundary is representable
//! as an OperationOutcome payload carrying a short code and a
//! human-readable detail string, so clients always receive a diagnosable
//! body, never a bare empty failure.

use ember_core::ValidationResult;
use serde_json::{Value, json};

/// Issue severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// Error - processing has failed.
    Error,
    /// Warning - processing succeeded but with concerns.
    Warning,
    /// Information - informational message.
    Information,
}

impl IssueSeverity {
    /// Returns the FHIR string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSeverity::Error => "error",
            IssueSeverity::Warning => "warning",
            IssueSeverity::Information => "information",
        }
    }
}

/// Builds an OperationOutcome with a single issue.
pub fn operation_outcome(severity: IssueSeverity, code: &str, details: &str) -> Value {
    json!({
        "resourceType": "OperationOutcome",
        "issue": [{
            "severity": severity.as_str(),
            "code": code,
            "details": { "text": details }
        }]
    })
}

/// Builds an OperationOutcome from a validation result, one issue per
/// finding.
pub fn validation_outcome(result: &ValidationResult) -> Value {
    let issues: Vec<Value> = result
        .issues()
        .iter()
        .map(|issue| {
            json!({
                "severity": IssueSeverity::Error.as_str(),
                "code": issue.code,
                "details": { "text": issue.details }
            })
        })
        .collect();
    json!({
        "resourceType": "OperationOutcome",
        "issue": issues
    })
}
