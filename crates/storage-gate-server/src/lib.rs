// crates/storage-gate-server/src/lib.rs
// ============================================================================
// Module: Storage Gate Server
// Description: HTTP surface exposing mapped storage resources.
// Purpose: Serve the batch orchestrator behind an axum router.
// Dependencies: axum, tokio, serde, storage-gate-core, storage-gate-config
// ============================================================================

//! ## Overview
//! The server crate wraps the synchronous mapping core in an async HTTP
//! surface: `GET /api/storage-resources/` returns a filtered, paginated
//! envelope of mapped resources, and `GET /healthz` reports liveness.
//! Handlers validate query parameters fail-closed, run the blocking batch
//! on the tokio blocking pool, and map upstream transport failures to
//! HTTP 502. Request outcomes flow through an [`AuditSink`] hook.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod server;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::NoopAuditSink;
pub use audit::ServerAuditEvent;
pub use audit::StderrAuditSink;
pub use server::ResourceBackend;
pub use server::ServerError;
pub use server::ServerState;
pub use server::build_router;
pub use server::serve;
