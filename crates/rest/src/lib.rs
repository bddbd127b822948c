//! # ember-rest - Hosting Transport Layer for Ember
//!
//! This crate is the HTTP face of Ember, a pluggable FHIR facade-server
//! framework: host applications contribute handler modules for the
//! resource types they serve, and this layer routes inbound
//! create/read/update/delete/patch/search interactions to the correct
//! handler through the capability registry.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ember_core::{AcceptAllEngine, ModuleCatalog, ModuleDescriptor};
//! use ember_rest::{ServerConfig, ServerContext, create_app, init_logging};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::parse();
//!     init_logging(&config.log_level);
//!
//!     let mut catalog = ModuleCatalog::new();
//!     catalog.register(ModuleDescriptor::new("my-module", my_module::exports));
//!
//!     // Fatal on unknown module, failing constructor, or duplicate handler.
//!     let context = ServerContext::initialize(&catalog, Arc::new(AcceptAllEngine), config)?;
//!     let app = create_app(context.clone());
//!
//!     let listener = tokio::net::TcpListener::bind(context.config().socket_addr()).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Interaction | HTTP Method | URL Pattern |
//! |------------|-------------|-------------|
//! | read | GET | `/[type]/[id]` |
//! | update | PUT | `/[type]/[id]` |
//! | patch | PATCH | `/[type]/[id]` |
//! | delete | DELETE | `/[type]/[id]` |
//! | create | POST | `/[type]` |
//! | search | GET | `/[type]?params` |
//! | capabilities | GET | `/metadata` |
//! | health | GET | `/health` |
//!
//! ## Compression
//!
//! Request bodies sent with `Content-Encoding: gzip` are decompressed
//! through a bounded streaming transform: the configured
//! `max_decompressed_body_size` caps how many bytes a compressed body may
//! expand to, and a body that would exceed it is rejected with `413`
//! before it is materialized. Responses are gzip-compressed when the
//! client sends `Accept-Encoding: gzip`.
//!
//! ## Error Handling
//!
//! All errors are returned as FHIR OperationOutcome resources with
//! appropriate HTTP status codes; see [`error::RestError`].
//!
//! ## Architecture
//!
//! - [`config`] - Server configuration
//! - [`context`] - The immutable server context (registry, validator,
//!   configuration)
//! - [`error`] - Error types and OperationOutcome conversion
//! - [`extractors`] - Request body extraction (including gzip)
//! - [`compression`] - The bounded gzip stream transform
//! - [`handlers`] - HTTP request handlers for each interaction
//! - [`responses`] - Envelope rendering and OperationOutcome generation
//! - [`routing`] - Route configuration

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod compression;
pub mod config;
pub mod context;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod responses;
pub mod routing;

// Re-export commonly used types
pub use compression::{Content, GzipCompressedContent, GzipContent, TransformError};
pub use config::ServerConfig;
pub use context::ServerContext;
pub use error::{RestError, RestResult};

use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Creates the Axum application from an initialized server context.
///
/// Sets up the full route table plus the middleware stack: tracing,
/// request ids, a request timeout, and CORS when enabled.
pub fn create_app(context: ServerContext) -> Router {
    let config = context.config().clone();

    info!(
        handlers = context.registry().len(),
        "Creating Ember transport layer"
    );

    let router = routing::create_routes(context);

    let service_builder = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(config.request_timeout),
        ));

    let router = if config.enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.layer(service_builder)
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("ember_rest={level},ember_core={level},tower_http=debug"))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
