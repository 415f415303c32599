// crates/storage-gate-server/src/audit.rs
// ============================================================================
// Module: Server Audit Hook
// Description: Minimal event hook for request outcomes.
// Purpose: Surface served batches and failures without a logging framework.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The server reports request outcomes through a thin [`AuditSink`] trait:
//! a stderr sink for deployments and a no-op sink for embedding and tests.
//! Events carry only what an operator needs to correlate a request with an
//! upstream failure; they are not a metrics surface.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::io::Write;

// ============================================================================
// SECTION: Events
// ============================================================================

/// One request-level outcome emitted by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerAuditEvent {
    /// A batch was served successfully.
    BatchServed {
        /// Storage-system filter on the request, when present.
        storage_system: Option<String>,
        /// Number of resources in the response page.
        returned: usize,
        /// Upstream total backing the pagination envelope.
        total: usize,
    },
    /// A request named a storage system absent from the configuration.
    UnconfiguredSystem {
        /// The unconfigured storage-system value.
        storage_system: String,
    },
    /// An upstream collaborator failed; the batch was aborted.
    UpstreamFailure {
        /// Failure detail from the collaborator.
        detail: String,
    },
}

impl fmt::Display for ServerAuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BatchServed {
                storage_system,
                returned,
                total,
            } => write!(
                f,
                "batch served: storage_system={} returned={returned} total={total}",
                storage_system.as_deref().unwrap_or("<all>")
            ),
            Self::UnconfiguredSystem {
                storage_system,
            } => {
                write!(f, "unconfigured storage system requested: {storage_system}")
            }
            Self::UpstreamFailure {
                detail,
            } => write!(f, "upstream failure: {detail}"),
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Receiver for server audit events.
pub trait AuditSink: Send + Sync {
    /// Records one event. Sinks must not fail the request path.
    fn record(&self, event: &ServerAuditEvent);
}

/// Sink that writes one line per event to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &ServerAuditEvent) {
        let mut stderr = std::io::stderr();
        // A full stderr must not fail the request path.
        let _ = writeln!(&mut stderr, "storage-gate: {event}");
    }
}

/// Sink that discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &ServerAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
