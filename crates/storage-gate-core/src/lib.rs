// crates/storage-gate-core/src/lib.rs
// ============================================================================
// Module: Storage Gate Core Library
// Description: Public API surface for the Storage Gate mapping core.
// Purpose: Expose hierarchy, quota, and mapping types plus collaborator seams.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Storage Gate core re-expresses flat marketplace allocation records as a
//! three-tier ownership hierarchy (tenant -> customer -> project/user) with
//! computed space and inode quotas, deterministic identifiers, and filesystem
//! mount paths. The core is CPU-local and transport-agnostic; it integrates
//! with the marketplace and the Unix-identity service through explicit
//! interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::core::*;

pub use interfaces::CustomerDirectory;
pub use interfaces::CustomerInfo;
pub use interfaces::GroupIdResolver;
pub use interfaces::RecordPage;
pub use interfaces::RecordQuery;
pub use interfaces::RecordSource;
pub use interfaces::UpstreamError;
pub use runtime::DEFAULT_PAGE_SIZE;
pub use runtime::HierarchyBuilder;
pub use runtime::MAX_PAGE_SIZE;
pub use runtime::Orchestrator;
pub use runtime::OrchestratorOutput;
pub use runtime::QuotaCalculator;
pub use runtime::QuotaSettings;
pub use runtime::ResourceFilter;
pub use runtime::ResourceMapper;
