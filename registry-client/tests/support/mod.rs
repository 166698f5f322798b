//! In-process registry that keeps real membership state, for tests that need
//! register/deregister to affect later calls.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use registry_client::config::{PollConfig, RegistryConfig};
use registry_client::RegistryClient;
use serde_json::{json, Value};
use shared::types::ServiceDescriptor;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub register: usize,
    pub health: usize,
    pub deregister: usize,
}

#[derive(Clone, Default)]
pub struct RegistryState {
    services: Arc<Mutex<HashMap<String, ServiceDescriptor>>>,
    calls: Arc<Mutex<CallCounts>>,
    reject_registrations: Arc<AtomicBool>,
}

impl RegistryState {
    pub fn calls(&self) -> CallCounts {
        *self.calls.lock().unwrap()
    }

    pub fn services(&self) -> Vec<ServiceDescriptor> {
        self.services.lock().unwrap().values().cloned().collect()
    }

    pub fn reject_registrations(&self) {
        self.reject_registrations.store(true, Ordering::SeqCst);
    }
}

pub struct FakeRegistry {
    pub url: String,
    pub state: RegistryState,
}

impl FakeRegistry {
    pub async fn start() -> Self {
        let state = RegistryState::default();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { url, state }
    }

    pub fn client(&self) -> RegistryClient {
        RegistryClient::new(&RegistryConfig {
            url: self.url.clone(),
            request_timeout_secs: Some(5),
        })
        .unwrap()
    }

    /// Wait until at least `n` health polls have arrived
    pub async fn wait_for_polls(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.state.calls().health < n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("health polls did not arrive in time");
    }
}

pub fn example_descriptor() -> ServiceDescriptor {
    ServiceDescriptor::new(
        "example-service",
        "example-service",
        "127.0.0.1",
        5000,
        vec!["example".to_string()],
    )
}

pub fn poll_every(interval_secs: u64) -> PollConfig {
    PollConfig {
        interval_secs,
        require_registration: false,
    }
}

fn router(state: RegistryState) -> Router {
    Router::new()
        .route("/v1/agent/service/register", put(register))
        .route("/v1/agent/service/deregister/:id", put(deregister))
        .route("/v1/health/service/:name", get(health))
        .with_state(state)
}

async fn register(
    State(state): State<RegistryState>,
    Json(descriptor): Json<ServiceDescriptor>,
) -> StatusCode {
    state.calls.lock().unwrap().register += 1;

    if state.reject_registrations.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    state
        .services
        .lock()
        .unwrap()
        .insert(descriptor.id.clone(), descriptor);
    StatusCode::OK
}

async fn deregister(State(state): State<RegistryState>, Path(id): Path<String>) -> StatusCode {
    state.calls.lock().unwrap().deregister += 1;

    match state.services.lock().unwrap().remove(&id) {
        Some(_) => StatusCode::OK,
        None => StatusCode::NOT_FOUND,
    }
}

async fn health(State(state): State<RegistryState>, Path(name): Path<String>) -> Json<Vec<Value>> {
    state.calls.lock().unwrap().health += 1;

    let entries = state
        .services
        .lock()
        .unwrap()
        .values()
        .filter(|service| service.name == name)
        .map(|service| {
            json!({
                "Node": { "Node": "fake-node", "Address": "127.0.0.1" },
                "Service": {
                    "ID": service.id,
                    "Service": service.name,
                    "Address": service.address,
                    "Port": service.port,
                    "Tags": service.tags,
                },
                "Checks": [
                    { "Node": "fake-node", "CheckID": "serfHealth", "Status": "passing" }
                ],
            })
        })
        .collect();

    Json(entries)
}
