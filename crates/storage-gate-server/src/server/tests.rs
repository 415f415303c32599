// crates/storage-gate-server/src/server/tests.rs
// ============================================================================
// Module: HTTP Server Unit Tests
// Description: Unit tests for handlers, validation, and the envelope.
// Purpose: Validate server behavior with in-memory backends.
// Dependencies: storage-gate-server, storage-gate-core
// ============================================================================

//! ## Overview
//! Exercises the listing and health handlers directly with in-memory
//! backends and a recording audit sink.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use axum::body::to_bytes;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::Value;
use storage_gate_core::IdScope;
use storage_gate_core::ItemId;
use storage_gate_core::MountPoint;
use storage_gate_core::OrchestratorOutput;
use storage_gate_core::Permission;
use storage_gate_core::ProjectTargetItem;
use storage_gate_core::ResourceFilter;
use storage_gate_core::StorageItem;
use storage_gate_core::StorageResource;
use storage_gate_core::Target;
use storage_gate_core::TargetStatus;
use storage_gate_core::UpstreamError;

use super::ListParams;
use super::ResourceBackend;
use super::ServerState;
use super::handle_health;
use super::handle_list;
use crate::audit::AuditSink;
use crate::audit::ServerAuditEvent;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Backend serving a fixed batch and recording the filters it receives.
struct StaticBackend {
    /// Canned batch output.
    output: OrchestratorOutput,
    /// Filters seen by `fetch`, in call order.
    seen: Mutex<Vec<(Vec<String>, ResourceFilter)>>,
}

impl StaticBackend {
    /// Creates a backend over a canned batch.
    fn new(output: OrchestratorOutput) -> Self {
        Self {
            output,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl ResourceBackend for StaticBackend {
    fn fetch(
        &self,
        offering_slugs: &[String],
        filter: &ResourceFilter,
    ) -> Result<OrchestratorOutput, UpstreamError> {
        self.seen
            .lock()
            .expect("seen lock")
            .push((offering_slugs.to_vec(), filter.clone()));
        Ok(self.output.clone())
    }
}

/// Backend whose collaborators always fail.
struct FailingBackend;

impl ResourceBackend for FailingBackend {
    fn fetch(
        &self,
        _offering_slugs: &[String],
        _filter: &ResourceFilter,
    ) -> Result<OrchestratorOutput, UpstreamError> {
        Err(UpstreamError::Marketplace("connection refused".to_string()))
    }
}

/// Sink capturing every event for assertions.
#[derive(Default)]
struct RecordingSink {
    /// Captured events, in emission order.
    events: Mutex<Vec<ServerAuditEvent>>,
}

impl AuditSink for RecordingSink {
    fn record(&self, event: &ServerAuditEvent) {
        self.events.lock().expect("events lock").push(event.clone());
    }
}

/// Builds a classification item for fixtures.
fn classification(scope: IdScope, key: &str) -> StorageItem {
    StorageItem {
        item_id: ItemId::stable(scope, key),
        key: key.to_string(),
        name: key.to_uppercase(),
        active: true,
        path: String::new(),
    }
}

/// Builds one mapped project leaf for canned batches.
fn sample_resource() -> StorageResource {
    StorageResource {
        item_id: ItemId::stable(IdScope::Project, "msclim-store"),
        status: TargetStatus::Active,
        mount_point: MountPoint {
            default: "/capstor/store/cscs/mch/msclim".to_string(),
        },
        permission: Permission::octal("775"),
        quotas: None,
        target: Target::Project(ProjectTargetItem {
            item_id: ItemId::stable(IdScope::Project, "msclim-store"),
            key: None,
            name: "msclim-store".to_string(),
            status: TargetStatus::Active,
            unix_gid: 31_000,
            active: true,
        }),
        storage_system: classification(IdScope::StorageSystem, "capstor"),
        storage_file_system: classification(IdScope::StorageFileSystem, "lustre"),
        storage_data_type: classification(IdScope::StorageDataType, "store"),
        parent_item_id: None,
        old_quotas: None,
        new_quotas: None,
        extra: BTreeMap::new(),
    }
}

/// Builds server state over a backend with one configured system.
fn sample_state(backend: Arc<dyn ResourceBackend>) -> (Arc<ServerState>, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let mut systems = BTreeMap::new();
    systems.insert("capstor".to_string(), "capstor-offering".to_string());
    systems.insert("vast".to_string(), "vast-offering".to_string());
    let state = Arc::new(ServerState::new(
        backend,
        systems,
        Arc::clone(&sink) as Arc<dyn AuditSink>,
    ));
    (state, sink)
}

/// Reads a response body as JSON.
async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("response body json")
}

/// Runs the listing handler with the given parameters.
async fn run_list(
    state: Arc<ServerState>,
    params: ListParams,
) -> axum::response::Response {
    handle_list(State(state), Query(params)).await.into_response()
}

// ============================================================================
// SECTION: Health Tests
// ============================================================================

#[tokio::test]
async fn health_endpoint_ok() {
    let response = handle_health().await.into_response();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

// ============================================================================
// SECTION: Listing Tests
// ============================================================================

#[tokio::test]
async fn listing_returns_success_envelope() {
    let backend = Arc::new(StaticBackend::new(OrchestratorOutput {
        resources: vec![sample_resource()],
        total: 42,
    }));
    let (state, sink) = sample_state(backend);

    let response = run_list(
        state,
        ListParams {
            storage_system: Some("capstor".to_string()),
            page: Some("2".to_string()),
            page_size: Some("10".to_string()),
            ..ListParams::default()
        },
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["resources"].as_array().expect("resources array").len(), 1);
    assert_eq!(body["pagination"]["current"], 2);
    assert_eq!(body["pagination"]["limit"], 10);
    assert_eq!(body["pagination"]["offset"], 10);
    assert_eq!(body["pagination"]["total"], 42);
    assert_eq!(body["pagination"]["pages"], 5);
    assert_eq!(body["pagination"]["has_next"], true);
    assert_eq!(body["filters_applied"]["storage_system"], "capstor");
    assert_eq!(body["filters_applied"]["state"], Value::Null);

    let events = sink.events.lock().expect("events lock");
    assert!(matches!(
        events.as_slice(),
        [ServerAuditEvent::BatchServed { returned: 1, total: 42, .. }]
    ));
}

#[tokio::test]
async fn system_filter_selects_one_offering() {
    let backend = Arc::new(StaticBackend::new(OrchestratorOutput::default()));
    let (state, _sink) = sample_state(Arc::clone(&backend) as Arc<dyn ResourceBackend>);

    let response = run_list(
        state,
        ListParams {
            storage_system: Some("vast".to_string()),
            ..ListParams::default()
        },
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let seen = backend.seen.lock().expect("seen lock");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, vec!["vast-offering".to_string()]);
    // Defaults apply when paging parameters are omitted.
    assert_eq!(seen[0].1.page, 1);
    assert_eq!(seen[0].1.page_size, storage_gate_core::DEFAULT_PAGE_SIZE);
}

#[tokio::test]
async fn missing_system_filter_selects_all_offerings() {
    let backend = Arc::new(StaticBackend::new(OrchestratorOutput::default()));
    let (state, _sink) = sample_state(Arc::clone(&backend) as Arc<dyn ResourceBackend>);

    let response = run_list(state, ListParams::default()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let seen = backend.seen.lock().expect("seen lock");
    assert_eq!(
        seen[0].0,
        vec!["capstor-offering".to_string(), "vast-offering".to_string()]
    );
}

#[tokio::test]
async fn unconfigured_system_yields_empty_success() {
    let backend = Arc::new(StaticBackend::new(OrchestratorOutput {
        resources: vec![sample_resource()],
        total: 1,
    }));
    let (state, sink) = sample_state(Arc::clone(&backend) as Arc<dyn ResourceBackend>);

    let response = run_list(
        state,
        ListParams {
            storage_system: Some("iopsstor".to_string()),
            ..ListParams::default()
        },
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["resources"].as_array().expect("resources array").len(), 0);
    assert_eq!(body["pagination"]["pages"], 0);
    assert_eq!(body["pagination"]["total"], 0);
    assert_eq!(body["filters_applied"]["storage_system"], "iopsstor");

    // The backend is never consulted for unconfigured systems.
    assert!(backend.seen.lock().expect("seen lock").is_empty());
    let events = sink.events.lock().expect("events lock");
    assert!(matches!(
        events.as_slice(),
        [ServerAuditEvent::UnconfiguredSystem { .. }]
    ));
}

// ============================================================================
// SECTION: Validation Tests
// ============================================================================

#[tokio::test]
async fn empty_storage_system_is_rejected() {
    let (state, _sink) = sample_state(Arc::new(StaticBackend::new(OrchestratorOutput::default())));
    let response = run_list(
        state,
        ListParams {
            storage_system: Some(String::new()),
            ..ListParams::default()
        },
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"], "ValidationError");
}

#[tokio::test]
async fn page_zero_is_rejected() {
    let (state, _sink) = sample_state(Arc::new(StaticBackend::new(OrchestratorOutput::default())));
    let response = run_list(
        state,
        ListParams {
            page: Some("0".to_string()),
            ..ListParams::default()
        },
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn oversized_page_size_is_rejected() {
    let (state, _sink) = sample_state(Arc::new(StaticBackend::new(OrchestratorOutput::default())));
    let response = run_list(
        state,
        ListParams {
            page_size: Some("501".to_string()),
            ..ListParams::default()
        },
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn non_numeric_page_is_rejected() {
    let (state, _sink) = sample_state(Arc::new(StaticBackend::new(OrchestratorOutput::default())));
    let response = run_list(
        state,
        ListParams {
            page: Some("two".to_string()),
            ..ListParams::default()
        },
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_state_value_is_rejected() {
    let (state, _sink) = sample_state(Arc::new(StaticBackend::new(OrchestratorOutput::default())));
    let response = run_list(
        state,
        ListParams {
            state: Some("Paused".to_string()),
            ..ListParams::default()
        },
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(
        body["detail"]
            .as_str()
            .expect("detail string")
            .contains("invalid state")
    );
}

#[tokio::test]
async fn unknown_data_type_is_rejected() {
    let (state, _sink) = sample_state(Arc::new(StaticBackend::new(OrchestratorOutput::default())));
    let response = run_list(
        state,
        ListParams {
            data_type: Some("tape".to_string()),
            ..ListParams::default()
        },
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn filters_echo_canonical_labels() {
    let backend = Arc::new(StaticBackend::new(OrchestratorOutput::default()));
    let (state, _sink) = sample_state(backend);

    let response = run_list(
        state,
        ListParams {
            state: Some("OK".to_string()),
            data_type: Some("store".to_string()),
            status: Some("active".to_string()),
            ..ListParams::default()
        },
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["filters_applied"]["state"], "OK");
    assert_eq!(body["filters_applied"]["data_type"], "store");
    assert_eq!(body["filters_applied"]["status"], "active");
    assert_eq!(body["filters_applied"]["storage_system"], Value::Null);
}

// ============================================================================
// SECTION: Error Mapping Tests
// ============================================================================

#[tokio::test]
async fn upstream_failure_maps_to_bad_gateway() {
    let (state, sink) = sample_state(Arc::new(FailingBackend));
    let response = run_list(state, ListParams::default()).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"], "UpstreamServiceError");

    let events = sink.events.lock().expect("events lock");
    assert!(matches!(
        events.as_slice(),
        [ServerAuditEvent::UpstreamFailure { .. }]
    ));
}
