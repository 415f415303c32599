// crates/storage-gate-server/src/server.rs
// ============================================================================
// Module: HTTP Server
// Description: Axum router and handlers for the storage-resource API.
// Purpose: Validate requests, run the blocking batch, shape the envelope.
// Dependencies: axum, tokio, serde, storage-gate-core
// ============================================================================

//! ## Overview
//! `GET /api/storage-resources/` accepts `storage_system`, `state`,
//! `data_type`, `status`, `page`, and `page_size` query parameters.
//! Parameters are validated fail-closed: malformed values are rejected
//! with 422 before any upstream call. A storage-system filter naming a
//! system absent from the configuration yields an empty success envelope
//! rather than an error. The synchronous batch runs on the tokio blocking
//! pool; upstream transport failures map to 502.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use serde::Deserialize;
use serde::Serialize;
use storage_gate_core::CustomerDirectory;
use storage_gate_core::GroupIdResolver;
use storage_gate_core::MAX_PAGE_SIZE;
use storage_gate_core::Orchestrator;
use storage_gate_core::OrchestratorOutput;
use storage_gate_core::RecordSource;
use storage_gate_core::ResourceFilter;
use storage_gate_core::ResourceState;
use storage_gate_core::StorageDataType;
use storage_gate_core::StorageResource;
use storage_gate_core::TargetStatus;
use storage_gate_core::UpstreamError;
use thiserror::Error;

use crate::audit::AuditSink;
use crate::audit::ServerAuditEvent;

#[cfg(test)]
mod tests;

// ============================================================================
// SECTION: Backend
// ============================================================================

/// Synchronous resource source behind the HTTP surface.
///
/// The production implementation is the batch orchestrator; tests use
/// in-memory fakes.
pub trait ResourceBackend: Send + Sync {
    /// Fetches one filtered batch for the given offering slugs.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when a collaborator transport fails.
    fn fetch(
        &self,
        offering_slugs: &[String],
        filter: &ResourceFilter,
    ) -> Result<OrchestratorOutput, UpstreamError>;
}

impl<S, D, G> ResourceBackend for Orchestrator<S, D, G>
where
    S: RecordSource + Send + Sync,
    D: CustomerDirectory + Send + Sync,
    G: GroupIdResolver + Send + Sync,
{
    fn fetch(
        &self,
        offering_slugs: &[String],
        filter: &ResourceFilter,
    ) -> Result<OrchestratorOutput, UpstreamError> {
        self.get_resources(offering_slugs, filter)
    }
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared state behind every handler.
pub struct ServerState {
    /// Batch source.
    backend: Arc<dyn ResourceBackend>,
    /// Configured storage systems mapped to their offering slugs.
    storage_systems: BTreeMap<String, String>,
    /// Outcome hook.
    audit: Arc<dyn AuditSink>,
}

impl ServerState {
    /// Creates server state over a backend and the configured systems.
    #[must_use]
    pub fn new(
        backend: Arc<dyn ResourceBackend>,
        storage_systems: BTreeMap<String, String>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            backend,
            storage_systems,
            audit,
        }
    }

    /// Resolves the offering slugs for a request.
    ///
    /// `None` for the filter selects every configured system; a filter
    /// naming an unconfigured system resolves to `None`.
    fn offering_slugs(&self, storage_system: Option<&str>) -> Option<Vec<String>> {
        match storage_system {
            Some(system) => self
                .storage_systems
                .get(system)
                .map(|slug| vec![slug.clone()]),
            None => Some(self.storage_systems.values().cloned().collect()),
        }
    }
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Raw query parameters for the listing endpoint.
///
/// Numeric fields arrive as strings so that malformed values produce a
/// 422 instead of a framework-level 400.
#[derive(Debug, Default, Deserialize)]
struct ListParams {
    /// Storage-system filter.
    storage_system: Option<String>,
    /// Upstream state filter.
    state: Option<String>,
    /// Data-type filter.
    data_type: Option<String>,
    /// Status filter.
    status: Option<String>,
    /// Page number, 1-based.
    page: Option<String>,
    /// Page size, `1..=500`.
    page_size: Option<String>,
}

/// Pagination block of the response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct Pagination {
    /// Requested page number.
    current: usize,
    /// Requested page size.
    limit: usize,
    /// Zero-based offset of the page start.
    offset: usize,
    /// Total page count.
    pages: usize,
    /// Total matching records upstream.
    total: usize,
    /// Whether a further page exists.
    has_next: bool,
}

impl Pagination {
    /// Derives the block from the request page and the upstream total.
    fn build(page: usize, page_size: usize, total: usize) -> Self {
        let pages = total.div_ceil(page_size);
        Self {
            current: page,
            limit: page_size,
            offset: (page - 1) * page_size,
            pages,
            total,
            has_next: page < pages,
        }
    }
}

/// Echo of the filters applied to the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct FiltersApplied {
    /// Storage-system filter, when given.
    storage_system: Option<String>,
    /// Data-type filter, canonical label.
    data_type: Option<String>,
    /// Status filter, canonical label.
    status: Option<String>,
    /// Upstream state filter, canonical label.
    state: Option<String>,
}

/// Success envelope for the listing endpoint.
#[derive(Debug, Clone, Serialize)]
struct ResourceEnvelope {
    /// Always `"success"`; errors use [`ApiError`] instead.
    status: &'static str,
    /// Mapped resources, hierarchy nodes first.
    resources: Vec<StorageResource>,
    /// Pagination block.
    pagination: Pagination,
    /// Filter echo.
    filters_applied: FiltersApplied,
}

impl ResourceEnvelope {
    /// Builds a success envelope.
    fn success(
        resources: Vec<StorageResource>,
        pagination: Pagination,
        filters_applied: FiltersApplied,
    ) -> Self {
        Self {
            status: "success",
            resources,
            pagination,
            filters_applied,
        }
    }
}

/// Liveness body for `/healthz`.
#[derive(Debug, Clone, Copy, Serialize)]
struct HealthBody {
    /// Always `"ok"` when the process is serving.
    status: &'static str,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Request-level error mapped to an HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ApiError {
    /// HTTP status for the response.
    status: StatusCode,
    /// Stable error kind label.
    error: &'static str,
    /// Human-readable detail.
    detail: String,
}

impl ApiError {
    /// Builds a 422 validation error.
    fn validation(detail: String) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            error: "ValidationError",
            detail,
        }
    }

    /// Builds a 502 upstream error.
    fn upstream(err: &UpstreamError) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            error: "UpstreamServiceError",
            detail: err.to_string(),
        }
    }

    /// Builds a 500 internal error.
    fn internal(detail: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "InternalServerError",
            detail,
        }
    }
}

/// Wire body for [`ApiError`].
#[derive(Debug, Clone, Serialize)]
struct ApiErrorBody {
    /// Always `"error"`.
    status: &'static str,
    /// Stable error kind label.
    error: &'static str,
    /// Human-readable detail.
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            status: "error",
            error: self.error,
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Fatal serving errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not bind to the configured address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Configured bind address.
        addr: SocketAddr,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The accept loop failed.
    #[error("server terminated: {0}")]
    Serve(#[source] std::io::Error),
}

// ============================================================================
// SECTION: Parameter Validation
// ============================================================================

/// Parses a positive count parameter with a default.
fn parse_count(
    value: Option<&str>,
    field: &'static str,
    default: usize,
) -> Result<usize, ApiError> {
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.parse::<usize>() {
        Ok(parsed) if parsed >= 1 => Ok(parsed),
        _ => Err(ApiError::validation(format!(
            "{field} must be a positive integer, got '{raw}'"
        ))),
    }
}

/// Parses the upstream state filter.
fn parse_state(value: &str) -> Result<ResourceState, ApiError> {
    match value {
        "Creating" => Ok(ResourceState::Creating),
        "OK" => Ok(ResourceState::Ok),
        "Erred" => Ok(ResourceState::Erred),
        "Updating" => Ok(ResourceState::Updating),
        "Terminating" => Ok(ResourceState::Terminating),
        "Terminated" => Ok(ResourceState::Terminated),
        _ => Err(ApiError::validation(format!(
            "invalid state '{value}'; use one of Creating, OK, Erred, Updating, \
             Terminating, Terminated"
        ))),
    }
}

/// Parses the data-type filter.
fn parse_data_type(value: &str) -> Result<StorageDataType, ApiError> {
    match value {
        "store" => Ok(StorageDataType::Store),
        "archive" => Ok(StorageDataType::Archive),
        "users" => Ok(StorageDataType::Users),
        "scratch" => Ok(StorageDataType::Scratch),
        _ => Err(ApiError::validation(format!(
            "invalid data_type '{value}'; use one of store, archive, users, scratch"
        ))),
    }
}

/// Parses the status filter.
fn parse_status(value: &str) -> Result<TargetStatus, ApiError> {
    match value {
        "pending" => Ok(TargetStatus::Pending),
        "active" => Ok(TargetStatus::Active),
        "removing" => Ok(TargetStatus::Removing),
        "removed" => Ok(TargetStatus::Removed),
        "error" => Ok(TargetStatus::Error),
        "updating" => Ok(TargetStatus::Updating),
        "unknown" => Ok(TargetStatus::Unknown),
        _ => Err(ApiError::validation(format!(
            "invalid status '{value}'; use one of pending, active, removing, \
             removed, error, updating, unknown"
        ))),
    }
}

/// Validated listing request.
#[derive(Debug, Clone)]
struct ListRequest {
    /// Storage-system filter, non-empty when present.
    storage_system: Option<String>,
    /// Batch filter for the orchestrator.
    filter: ResourceFilter,
}

impl ListRequest {
    /// Validates raw query parameters fail-closed.
    fn from_params(params: &ListParams) -> Result<Self, ApiError> {
        let storage_system = match params.storage_system.as_deref() {
            Some("") => {
                return Err(ApiError::validation(
                    "storage_system cannot be empty; specify a configured system \
                     or omit the parameter"
                        .to_string(),
                ));
            }
            other => other.map(str::to_string),
        };

        let page = parse_count(params.page.as_deref(), "page", 1)?;
        let page_size = parse_count(
            params.page_size.as_deref(),
            "page_size",
            storage_gate_core::DEFAULT_PAGE_SIZE,
        )?;
        if page_size > MAX_PAGE_SIZE {
            return Err(ApiError::validation(format!(
                "page_size must be at most {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }

        let state = params.state.as_deref().map(parse_state).transpose()?;
        let data_type = params.data_type.as_deref().map(parse_data_type).transpose()?;
        let status = params.status.as_deref().map(parse_status).transpose()?;

        Ok(Self {
            storage_system,
            filter: ResourceFilter {
                state,
                data_type,
                status,
                page,
                page_size,
            },
        })
    }

    /// Builds the filter echo for the envelope.
    fn filters_applied(&self) -> FiltersApplied {
        FiltersApplied {
            storage_system: self.storage_system.clone(),
            data_type: self.filter.data_type.map(|value| value.as_str().to_string()),
            status: self.filter.status.map(|value| value.as_str().to_string()),
            state: self.filter.state.map(|value| value.as_str().to_string()),
        }
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Serves the filtered, paginated resource listing.
async fn handle_list(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let request = ListRequest::from_params(&params)?;

    let Some(offering_slugs) = state.offering_slugs(request.storage_system.as_deref()) else {
        // Unconfigured systems are empty, not errors.
        let system = request.storage_system.clone().unwrap_or_default();
        state.audit.record(&ServerAuditEvent::UnconfiguredSystem {
            storage_system: system,
        });
        let envelope = ResourceEnvelope::success(
            Vec::new(),
            Pagination {
                current: request.filter.page,
                limit: request.filter.page_size,
                offset: (request.filter.page - 1) * request.filter.page_size,
                pages: 0,
                total: 0,
                has_next: false,
            },
            request.filters_applied(),
        );
        return Ok(Json(envelope).into_response());
    };

    let backend = Arc::clone(&state.backend);
    let filter = request.filter.clone();
    let output = tokio::task::spawn_blocking(move || backend.fetch(&offering_slugs, &filter))
        .await
        .map_err(|err| ApiError::internal(format!("batch task failed: {err}")))?;

    match output {
        Ok(batch) => {
            state.audit.record(&ServerAuditEvent::BatchServed {
                storage_system: request.storage_system.clone(),
                returned: batch.resources.len(),
                total: batch.total,
            });
            let pagination =
                Pagination::build(request.filter.page, request.filter.page_size, batch.total);
            let envelope =
                ResourceEnvelope::success(batch.resources, pagination, request.filters_applied());
            Ok(Json(envelope).into_response())
        }
        Err(err) => {
            state.audit.record(&ServerAuditEvent::UpstreamFailure {
                detail: err.to_string(),
            });
            Err(ApiError::upstream(&err))
        }
    }
}

/// Reports process liveness.
async fn handle_health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
    })
}

// ============================================================================
// SECTION: Router and Serving
// ============================================================================

/// Builds the application router over shared state.
#[must_use]
pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/storage-resources/", get(handle_list))
        .route("/healthz", get(handle_health))
        .with_state(state)
}

/// Binds the listener and serves until the accept loop terminates.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] when the address cannot be bound and
/// [`ServerError::Serve`] when the accept loop fails.
pub async fn serve(state: Arc<ServerState>, bind: SocketAddr) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: bind,
            source,
        })?;
    axum::serve(listener, build_router(state))
        .await
        .map_err(ServerError::Serve)
}
