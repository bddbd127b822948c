//! # ember-core - Pluggable FHIR Facade Framework Core
//!
//! Core types for Ember, a framework that lets independently compiled
//! handler modules register themselves for named FHIR resource types and
//! serve create/read/update/delete/patch operations through a uniform
//! envelope.
//!
//! ## Architecture
//!
//! - [`key`] - Resource identity: the (base, type, id, version) tuple with
//!   lossless URI round-tripping and explicit resource stamping
//! - [`response`] - The uniform result envelope every handler operation
//!   returns
//! - [`service`] - The handler capability trait and its error surface
//! - [`registry`] - Startup-time module scan and the immutable
//!   (capability, resource type) → handler mapping
//! - [`validation`] - The profile-validator binding over an opaque
//!   external engine
//! - [`error`] - Key and registry error taxonomy
//!
//! ## Startup flow
//!
//! ```rust
//! use std::sync::Arc;
//! use ember_core::{Capability, CapabilityRegistry, ModuleCatalog, ModuleDescriptor};
//! # fn exports() -> Vec<ember_core::ServiceExport> { Vec::new() }
//!
//! let mut catalog = ModuleCatalog::new();
//! catalog.register(ModuleDescriptor::new("my-module", exports));
//!
//! // Fatal on unknown module, failing constructor, or duplicate handler.
//! let registry = CapabilityRegistry::scan(&catalog, ["my-module"]).unwrap();
//! let handler = registry.resolve(Capability::Primary, "Patient");
//! # let _ = handler;
//! ```

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod key;
pub mod registry;
pub mod response;
pub mod service;
pub mod validation;

// Re-export commonly used types
pub use error::{KeyError, RegistryError};
pub use key::{KeyResult, ResourceKey};
pub use registry::{
    Capability, CapabilityRegistry, ModuleCatalog, ModuleDescriptor, ServiceExport,
};
pub use response::FhirResponse;
pub use service::{FhirService, SearchParams, ServiceError, ServiceResult};
pub use validation::{
    AcceptAllEngine, ProfileValidator, ValidationEngine, ValidationIssue, ValidationResult,
};
