//! The capability registry.
//!
//! At process startup the host resolves a configured list of handler
//! modules against a [`ModuleCatalog`], and [`CapabilityRegistry::scan`]
//! walks each module's exports, classifies every export against the fixed
//! capability priority order, instantiates it, and registers the instance
//! under `(capability, resource type)`. The scan is strictly sequential and
//! runs exactly once; the finished registry is immutable, so it can be
//! shared across request-handling tasks behind an `Arc` without locking.
//!
//! All scan failures are fatal: a missing module, a failing constructor, or
//! a duplicate registration each mean the server cannot correctly route
//! requests, and a half-built registry must never be published.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::RegistryError;
use crate::service::FhirService;

/// The roles a handler module can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// A real handler backing a resource type.
    Primary,
    /// A mock handler answering when no primary handler is bound.
    Mock,
}

impl Capability {
    /// Fixed classification order. An export offering several capabilities
    /// is bound to the first one it offers in this order, so classification
    /// is deterministic.
    pub const PRIORITY: [Capability; 2] = [Capability::Primary, Capability::Mock];

    /// Short name used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Primary => "primary",
            Capability::Mock => "mock",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete service a module exports, as an explicit registration entry
/// rather than a reflected type: the type name (for diagnostics), the
/// capabilities the service can fill, and its zero-argument constructor.
pub struct ServiceExport {
    type_name: &'static str,
    provides: &'static [Capability],
    construct: fn() -> anyhow::Result<Arc<dyn FhirService>>,
}

impl ServiceExport {
    /// Creates an export entry.
    pub fn new(
        type_name: &'static str,
        provides: &'static [Capability],
        construct: fn() -> anyhow::Result<Arc<dyn FhirService>>,
    ) -> Self {
        Self {
            type_name,
            provides,
            construct,
        }
    }

    fn classify(&self) -> Option<Capability> {
        Capability::PRIORITY
            .iter()
            .copied()
            .find(|capability| self.provides.contains(capability))
    }
}

/// A loadable handler module: a name the configuration refers to, plus the
/// function enumerating its exports.
pub struct ModuleDescriptor {
    name: &'static str,
    exports: fn() -> Vec<ServiceExport>,
}

impl ModuleDescriptor {
    /// Creates a module descriptor.
    pub fn new(name: &'static str, exports: fn() -> Vec<ServiceExport>) -> Self {
        Self { name, exports }
    }

    /// The module's configured name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// The set of modules a host application makes available for loading.
///
/// Configuration selects from this catalog by name; a configured name the
/// catalog does not know is a fatal startup error.
#[derive(Default)]
pub struct ModuleCatalog {
    modules: HashMap<&'static str, ModuleDescriptor>,
}

impl ModuleCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module to the catalog. Re-registering a name replaces the
    /// previous descriptor; the catalog is host-assembled, not scanned, so
    /// collisions here are the host's own doing.
    pub fn register(&mut self, descriptor: ModuleDescriptor) {
        self.modules.insert(descriptor.name, descriptor);
    }

    fn get(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.modules.get(name)
    }
}

/// Immutable mapping from `(capability, resource type)` to handler
/// instance, built once at startup by [`CapabilityRegistry::scan`].
pub struct CapabilityRegistry {
    services: HashMap<(Capability, String), Arc<dyn FhirService>>,
}

// Manual Debug: handler instances are opaque trait objects, so only the
// registered entry keys are shown.
impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<String> = self
            .services
            .keys()
            .map(|(capability, resource_type)| format!("{capability}/{resource_type}"))
            .collect();
        entries.sort_unstable();
        f.debug_struct("CapabilityRegistry")
            .field("services", &entries)
            .finish()
    }
}

impl CapabilityRegistry {
    /// Builds the registry by scanning the named modules in order.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::ModuleNotFound`] when a configured module name is
    ///   not in the catalog.
    /// - [`RegistryError::HandlerInitialization`] when an export's
    ///   constructor fails.
    /// - [`RegistryError::DuplicateHandler`] when two exports claim the
    ///   same `(capability, resource type)` pair.
    ///
    /// All three are fatal: the host must abort startup rather than serve
    /// traffic from a partially built registry.
    pub fn scan<I, S>(catalog: &ModuleCatalog, module_names: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut services: HashMap<(Capability, String), Arc<dyn FhirService>> = HashMap::new();

        for name in module_names {
            let name = name.as_ref();
            let module = catalog.get(name).ok_or_else(|| RegistryError::ModuleNotFound {
                module: name.to_string(),
            })?;

            debug!(module = %name, "Scanning handler module");

            for export in (module.exports)() {
                let Some(capability) = export.classify() else {
                    debug!(
                        module = %name,
                        type_name = %export.type_name,
                        "Export offers no recognized capability, skipping"
                    );
                    continue;
                };

                let instance = (export.construct)().map_err(|source| {
                    RegistryError::HandlerInitialization {
                        type_name: export.type_name.to_string(),
                        source,
                    }
                })?;

                let resource_type = instance.resource_type().to_string();
                info!(
                    module = %name,
                    type_name = %export.type_name,
                    capability = %capability,
                    resource_type = %resource_type,
                    "Registering handler"
                );

                let entry = (capability, resource_type);
                if services.contains_key(&entry) {
                    return Err(RegistryError::DuplicateHandler {
                        capability,
                        resource_type: entry.1,
                    });
                }
                services.insert(entry, instance);
            }
        }

        Ok(Self { services })
    }

    /// Looks up the handler bound for a capability and resource type.
    ///
    /// `None` is a normal negative result, meaning no module registered a
    /// handler for this resource type; the transport layer maps it to a
    /// 404-class response.
    pub fn resolve(&self, capability: Capability, resource_type: &str) -> Option<Arc<dyn FhirService>> {
        self.services
            .get(&(capability, resource_type.to_string()))
            .cloned()
    }

    /// All resource types with at least one bound handler, sorted.
    pub fn resource_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self
            .services
            .keys()
            .map(|(_, resource_type)| resource_type.as_str())
            .collect();
        types.sort_unstable();
        types.dedup();
        types
    }

    /// Number of registered handler instances.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the scan registered nothing.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ResourceKey;
    use crate::response::FhirResponse;
    use crate::service::{SearchParams, ServiceError, ServiceResult};
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct StubService {
        resource_type: &'static str,
    }

    #[async_trait]
    impl FhirService for StubService {
        fn resource_type(&self) -> &str {
            self.resource_type
        }

        async fn create(&self, _key: &ResourceKey, _resource: Value) -> ServiceResult<FhirResponse> {
            Ok(FhirResponse::no_content())
        }

        async fn read(&self, id: &str) -> ServiceResult<Value> {
            Ok(json!({ "resourceType": self.resource_type, "id": id }))
        }

        async fn search(&self, _params: &SearchParams) -> ServiceResult<Value> {
            Ok(json!({ "resourceType": "Bundle", "entry": [] }))
        }

        async fn update(&self, _key: &ResourceKey, _resource: Value) -> ServiceResult<FhirResponse> {
            Ok(FhirResponse::no_content())
        }

        async fn delete(&self, _key: &ResourceKey) -> ServiceResult<FhirResponse> {
            Ok(FhirResponse::no_content())
        }

        async fn patch(&self, _key: &ResourceKey, _patch: Value) -> ServiceResult<FhirResponse> {
            Err(ServiceError::Processing {
                message: "stub".to_string(),
            })
        }
    }

    fn patient_export() -> ServiceExport {
        ServiceExport::new("StubService<Patient>", &[Capability::Primary], || {
            Ok(Arc::new(StubService {
                resource_type: "Patient",
            }))
        })
    }

    fn catalog_with(exports: fn() -> Vec<ServiceExport>) -> ModuleCatalog {
        let mut catalog = ModuleCatalog::new();
        catalog.register(ModuleDescriptor::new("demo", exports));
        catalog
    }

    #[test]
    fn test_scan_registers_and_resolves() {
        let catalog = catalog_with(|| vec![patient_export()]);
        let registry = CapabilityRegistry::scan(&catalog, ["demo"]).unwrap();

        let handler = registry.resolve(Capability::Primary, "Patient").unwrap();
        assert_eq!(handler.resource_type(), "Patient");
        assert!(registry.resolve(Capability::Primary, "Unknown").is_none());
        assert!(registry.resolve(Capability::Mock, "Patient").is_none());
        assert_eq!(registry.resource_types(), vec!["Patient"]);
    }

    #[test]
    fn test_unknown_module_is_fatal() {
        let catalog = catalog_with(|| vec![patient_export()]);
        let err = CapabilityRegistry::scan(&catalog, ["missing"]).unwrap_err();
        assert!(matches!(err, RegistryError::ModuleNotFound { module } if module == "missing"));
    }

    #[test]
    fn test_duplicate_registration_is_fatal() {
        let catalog = catalog_with(|| vec![patient_export(), patient_export()]);
        let err = CapabilityRegistry::scan(&catalog, ["demo"]).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateHandler {
                capability: Capability::Primary,
                ..
            }
        ));
    }

    #[test]
    fn test_constructor_failure_is_fatal() {
        let catalog = catalog_with(|| {
            vec![ServiceExport::new(
                "BrokenService",
                &[Capability::Primary],
                || anyhow::bail!("no database"),
            )]
        });
        let err = CapabilityRegistry::scan(&catalog, ["demo"]).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::HandlerInitialization { type_name, .. } if type_name == "BrokenService"
        ));
    }

    #[test]
    fn test_export_without_capability_is_skipped() {
        let catalog = catalog_with(|| {
            vec![
                ServiceExport::new("Helper", &[], || {
                    Ok(Arc::new(StubService {
                        resource_type: "Helper",
                    }))
                }),
                patient_export(),
            ]
        });
        let registry = CapabilityRegistry::scan(&catalog, ["demo"]).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_debug_lists_entry_keys() {
        let catalog = catalog_with(|| vec![patient_export()]);
        let registry = CapabilityRegistry::scan(&catalog, ["demo"]).unwrap();
        let rendered = format!("{registry:?}");
        assert!(rendered.contains("primary/Patient"), "got {rendered}");
    }

    #[test]
    fn test_classification_follows_priority_order() {
        let catalog = catalog_with(|| {
            vec![ServiceExport::new(
                "DualService",
                // Offered mock-first; the fixed priority still binds primary.
                &[Capability::Mock, Capability::Primary],
                || {
                    Ok(Arc::new(StubService {
                        resource_type: "Patient",
                    }))
                },
            )]
        });
        let registry = CapabilityRegistry::scan(&catalog, ["demo"]).unwrap();
        assert!(registry.resolve(Capability::Primary, "Patient").is_some());
        assert!(registry.resolve(Capability::Mock, "Patient").is_none());
    }
}
