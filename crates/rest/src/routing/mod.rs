//! Route configuration for the transport layer.

pub mod fhir_routes;

pub use fhir_routes::create_routes;
