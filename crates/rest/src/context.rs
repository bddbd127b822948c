//! Server context shared with all request handlers.
//!
//! The context is built exactly once at startup, before the router exists,
//! and is immutable from then on. Handlers receive it by reference through
//! axum state; there is no ambient or global lookup.

use std::sync::Arc;

use ember_core::{
    Capability, CapabilityRegistry, FhirService, ModuleCatalog, ProfileValidator, RegistryError,
    ValidationEngine,
};
use tracing::info;

use crate::config::ServerConfig;

/// Immutable composition root: the capability registry, the bound profile
/// validator, and the server configuration.
pub struct ServerContext {
    registry: Arc<CapabilityRegistry>,
    validator: Arc<ProfileValidator>,
    config: Arc<ServerConfig>,
}

// Manual Clone: every field is an Arc, the inner types need not be Clone.
impl Clone for ServerContext {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            validator: Arc::clone(&self.validator),
            config: Arc::clone(&self.config),
        }
    }
}

impl ServerContext {
    /// Builds the context: scans the configured modules into a registry
    /// and binds the one profile validator.
    ///
    /// # Errors
    ///
    /// Any [`RegistryError`] is fatal; the host must abort startup rather
    /// than serve traffic from a partially initialized registry.
    pub fn initialize(
        catalog: &ModuleCatalog,
        engine: Arc<dyn ValidationEngine>,
        config: ServerConfig,
    ) -> Result<Self, RegistryError> {
        let registry = CapabilityRegistry::scan(catalog, config.module_names())?;
        info!(
            handlers = registry.len(),
            resource_types = registry.resource_types().len(),
            "Capability registry built"
        );

        Ok(Self {
            registry: Arc::new(registry),
            validator: Arc::new(ProfileValidator::new(engine)),
            config: Arc::new(config),
        })
    }

    /// Resolves the handler serving `resource_type`: the primary handler
    /// when one is bound, otherwise the mock handler. `None` means no
    /// module registered either.
    pub fn resolve_service(&self, resource_type: &str) -> Option<Arc<dyn FhirService>> {
        Capability::PRIORITY
            .iter()
            .find_map(|&capability| self.registry.resolve(capability, resource_type))
    }

    /// The capability registry.
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// The bound profile validator.
    pub fn validator(&self) -> &ProfileValidator {
        &self.validator
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The base URL keys are anchored at when serialized into headers.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::AcceptAllEngine;

    #[test]
    fn test_initialize_fails_on_unknown_module() {
        let catalog = ModuleCatalog::new();
        let config = ServerConfig {
            modules: vec!["ghost".to_string()],
            ..Default::default()
        };
        let err = ServerContext::initialize(&catalog, Arc::new(AcceptAllEngine), config)
            .err()
            .expect("expected fatal registry error");
        assert!(matches!(err, RegistryError::ModuleNotFound { .. }));
    }

    #[test]
    fn test_initialize_with_no_modules() {
        let catalog = ModuleCatalog::new();
        let context =
            ServerContext::initialize(&catalog, Arc::new(AcceptAllEngine), ServerConfig::default())
                .unwrap();
        assert!(context.registry().is_empty());
        assert!(context.resolve_service("Patient").is_none());
    }
}
