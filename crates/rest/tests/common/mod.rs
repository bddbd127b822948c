//! Shared test fixtures: demo handler modules and server construction.
//!
//! `demo-patient` contributes a primary in-memory Patient handler;
//! `demo-mock` contributes a mock Observation handler that answers with
//! canned payloads. Together they play the role of the host application's
//! handler modules.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;
use ember_core::{
    AcceptAllEngine, Capability, FhirResponse, FhirService, ModuleCatalog, ModuleDescriptor,
    ResourceKey, SearchParams, ServiceError, ServiceExport, ServiceResult,
};
use ember_rest::{ServerConfig, ServerContext, create_app};
use http::StatusCode;
use serde_json::{Value, json};

/// In-memory Patient store keyed by id, carrying a version counter per
/// resource.
#[derive(Default)]
pub struct InMemoryPatientService {
    store: Mutex<HashMap<String, (Value, u64)>>,
}

impl InMemoryPatientService {
    fn stamp(resource: &mut Value, id: &str, version: u64) -> ResourceKey {
        let key = ResourceKey::create_versioned("Patient", id, version.to_string())
            .expect("valid key parts");
        key.stamp(resource).expect("stampable resource");
        key
    }
}

#[async_trait]
impl FhirService for InMemoryPatientService {
    fn resource_type(&self) -> &str {
        "Patient"
    }

    async fn create(&self, _key: &ResourceKey, mut resource: Value) -> ServiceResult<FhirResponse> {
        let id = uuid::Uuid::new_v4().to_string();
        let key = Self::stamp(&mut resource, &id, 1);
        self.store
            .lock()
            .unwrap()
            .insert(id, (resource.clone(), 1));
        Ok(FhirResponse::created(key, resource))
    }

    async fn read(&self, id: &str) -> ServiceResult<Value> {
        self.store
            .lock()
            .unwrap()
            .get(id)
            .map(|(resource, _)| resource.clone())
            .ok_or_else(|| ServiceError::NotFound {
                type_name: "Patient".to_string(),
                id: id.to_string(),
            })
    }

    async fn search(&self, params: &SearchParams) -> ServiceResult<Value> {
        let store = self.store.lock().unwrap();
        let entries: Vec<Value> = store
            .iter()
            .filter(|(id, _)| params.get("_id").is_none_or(|wanted| wanted == id.as_str()))
            .map(|(_, (resource, _))| json!({ "resource": resource }))
            .collect();
        Ok(json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "total": entries.len(),
            "entry": entries,
        }))
    }

    async fn update(&self, key: &ResourceKey, mut resource: Value) -> ServiceResult<FhirResponse> {
        let id = key
            .resource_id()
            .ok_or_else(|| ServiceError::Invalid {
                message: "update requires a resource id".to_string(),
            })?
            .to_string();

        let mut store = self.store.lock().unwrap();
        let (version, status) = match store.get(&id) {
            Some((_, version)) => (version + 1, StatusCode::OK),
            None => (1, StatusCode::CREATED),
        };
        let key = Self::stamp(&mut resource, &id, version);
        store.insert(id, (resource.clone(), version));
        Ok(FhirResponse::new(status)
            .with_key(key)
            .with_resource(resource))
    }

    async fn delete(&self, key: &ResourceKey) -> ServiceResult<FhirResponse> {
        let id = key.resource_id().unwrap_or_default();
        let removed = self.store.lock().unwrap().remove(id);
        match removed {
            Some(_) => Ok(FhirResponse::no_content()),
            None => Err(ServiceError::NotFound {
                type_name: "Patient".to_string(),
                id: id.to_string(),
            }),
        }
    }

    async fn patch(&self, key: &ResourceKey, patch: Value) -> ServiceResult<FhirResponse> {
        let id = key
            .resource_id()
            .ok_or_else(|| ServiceError::Invalid {
                message: "patch requires a resource id".to_string(),
            })?
            .to_string();

        let patch: json_patch::Patch =
            serde_json::from_value(patch).map_err(|e| ServiceError::Invalid {
                message: format!("invalid JSON Patch document: {e}"),
            })?;

        let mut store = self.store.lock().unwrap();
        let Some((resource, version)) = store.get(&id).cloned() else {
            return Err(ServiceError::NotFound {
                type_name: "Patient".to_string(),
                id,
            });
        };

        let mut patched = resource;
        json_patch::patch(&mut patched, &patch).map_err(|e| ServiceError::Processing {
            message: format!("patch failed: {e}"),
        })?;

        let version = version + 1;
        let key = Self::stamp(&mut patched, &id, version);
        store.insert(id, (patched.clone(), version));
        Ok(FhirResponse::new(StatusCode::OK)
            .with_key(key)
            .with_resource(patched))
    }
}

/// Mock Observation handler answering every read with a canned payload.
#[derive(Default)]
pub struct MockObservationService;

#[async_trait]
impl FhirService for MockObservationService {
    fn resource_type(&self) -> &str {
        "Observation"
    }

    async fn create(&self, _key: &ResourceKey, _resource: Value) -> ServiceResult<FhirResponse> {
        Err(ServiceError::Processing {
            message: "mock handler is read-only".to_string(),
        })
    }

    async fn read(&self, id: &str) -> ServiceResult<Value> {
        Ok(json!({
            "resourceType": "Observation",
            "id": id,
            "status": "final",
            "code": { "text": "mock observation" },
        }))
    }

    async fn search(&self, _params: &SearchParams) -> ServiceResult<Value> {
        Ok(json!({ "resourceType": "Bundle", "type": "searchset", "total": 0, "entry": [] }))
    }

    async fn update(&self, _key: &ResourceKey, _resource: Value) -> ServiceResult<FhirResponse> {
        Err(ServiceError::Processing {
            message: "mock handler is read-only".to_string(),
        })
    }

    async fn delete(&self, _key: &ResourceKey) -> ServiceResult<FhirResponse> {
        Err(ServiceError::Processing {
            message: "mock handler is read-only".to_string(),
        })
    }

    async fn patch(&self, _key: &ResourceKey, _patch: Value) -> ServiceResult<FhirResponse> {
        Err(ServiceError::Processing {
            message: "mock handler is read-only".to_string(),
        })
    }
}

fn patient_exports() -> Vec<ServiceExport> {
    vec![ServiceExport::new(
        "InMemoryPatientService",
        &[Capability::Primary],
        || Ok(Arc::new(InMemoryPatientService::default())),
    )]
}

fn mock_exports() -> Vec<ServiceExport> {
    vec![ServiceExport::new(
        "MockObservationService",
        &[Capability::Mock],
        || Ok(Arc::new(MockObservationService)),
    )]
}

/// The catalog a test host would assemble.
pub fn demo_catalog() -> ModuleCatalog {
    let mut catalog = ModuleCatalog::new();
    catalog.register(ModuleDescriptor::new("demo-patient", patient_exports));
    catalog.register(ModuleDescriptor::new("demo-mock", mock_exports));
    catalog
}

/// Builds a test server with both demo modules loaded.
pub fn demo_server() -> TestServer {
    demo_server_with(|_| {})
}

/// Builds a test server, letting the test adjust the configuration first.
pub fn demo_server_with(adjust: impl FnOnce(&mut ServerConfig)) -> TestServer {
    let mut config = ServerConfig {
        modules: vec!["demo-patient".to_string(), "demo-mock".to_string()],
        ..Default::default()
    };
    adjust(&mut config);

    let context = ServerContext::initialize(&demo_catalog(), Arc::new(AcceptAllEngine), config)
        .expect("demo context builds");
    TestServer::new(create_app(context)).expect("test server builds")
}
