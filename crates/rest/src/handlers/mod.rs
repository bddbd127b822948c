//! HTTP request handlers for FHIR interactions.
//!
//! One handler per interaction:
//!
//! - [`create`] - Create a new resource
//! - [`read`] - Read a resource by id
//! - [`search`] - Search a resource type
//! - [`update`] - Update an existing resource
//! - [`patch`] - Patch a resource
//! - [`delete`] - Delete a resource
//! - [`metadata`] - Server capabilities (CapabilityStatement)
//! - [`health`] - Health check endpoint
//!
//! Each handler resolves its service through the capability registry
//! (primary first, then mock) and hands the resulting envelope to the
//! response formatter.

pub mod create;
pub mod delete;
pub mod health;
pub mod metadata;
pub mod patch;
pub mod read;
pub mod search;
pub mod update;

// Re-export handlers for convenience
pub use create::create_handler;
pub use delete::delete_handler;
pub use health::health_handler;
pub use metadata::metadata_handler;
pub use patch::patch_handler;
pub use read::read_handler;
pub use search::search_handler;
pub use update::update_handler;

use std::sync::Arc;

use ember_core::FhirService;

use crate::context::ServerContext;
use crate::error::{RestError, RestResult};

/// Resolves the handler for a resource type, or fails with the 404-class
/// "no handler registered" error.
fn resolve_service(context: &ServerContext, resource_type: &str) -> RestResult<Arc<dyn FhirService>> {
    context
        .resolve_service(resource_type)
        .ok_or_else(|| RestError::NoHandler {
            resource_type: resource_type.to_string(),
        })
}
