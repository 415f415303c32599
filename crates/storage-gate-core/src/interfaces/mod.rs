// crates/storage-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Storage Gate Interfaces
// Description: Backend-agnostic interfaces for marketplace and identity I/O.
// Purpose: Define the contract surfaces used by the mapping runtime.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the mapping core integrates with the upstream
//! marketplace and the Unix-identity service without embedding transport
//! details. Implementations surface transport failures as typed upstream
//! errors, distinct from per-record mapping failures which degrade to
//! skipping the record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::ItemId;
use crate::core::record::ResourceState;
use crate::core::record::UpstreamResource;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Upstream collaborator failure, surfaced to the orchestrator boundary.
///
/// # Invariants
/// - Variants are stable for programmatic handling; transport failures never
///   masquerade as mapping-logic errors.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Marketplace API returned an error or timed out.
    #[error("marketplace error: {0}")]
    Marketplace(String),
    /// Identity service returned an error or timed out.
    #[error("identity service error: {0}")]
    Identity(String),
}

// ============================================================================
// SECTION: Record Source
// ============================================================================

/// Query parameters for a marketplace record listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordQuery {
    /// Offering slugs to fetch (one per storage system in scope).
    pub offering_slugs: Vec<String>,
    /// Optional upstream state filter.
    pub state: Option<ResourceState>,
    /// Page number, 1-based.
    pub page: usize,
    /// Page size.
    pub page_size: usize,
}

/// One page of marketplace records plus the total count upstream reports.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordPage {
    /// Records in this page.
    pub records: Vec<UpstreamResource>,
    /// Total records matching the query upstream.
    pub total: usize,
}

/// Source of upstream marketplace resource records.
pub trait RecordSource {
    /// Lists resource records for the given query.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the marketplace cannot be reached or
    /// returns an error response.
    fn list_records(&self, query: &RecordQuery) -> Result<RecordPage, UpstreamError>;
}

// ============================================================================
// SECTION: Customer Directory
// ============================================================================

/// Customer metadata used to synthesize customer hierarchy nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    /// Upstream customer identifier.
    #[serde(rename = "itemId")]
    pub item_id: ItemId,
    /// Customer slug.
    pub key: String,
    /// Display name.
    pub name: String,
}

/// Directory of customers per offering scope.
pub trait CustomerDirectory {
    /// Returns the customers registered under an offering, keyed by slug.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the directory cannot be fetched.
    fn offering_customers(
        &self,
        offering_uuid: &str,
    ) -> Result<BTreeMap<String, CustomerInfo>, UpstreamError>;
}

// ============================================================================
// SECTION: Group Id Resolver
// ============================================================================

/// Resolver from project slug to Unix group id.
///
/// Lenient implementations substitute a deterministic placeholder id where
/// an id is absent; strict implementations propagate absence as `Ok(None)`,
/// which makes the affected leaf fail closed.
pub trait GroupIdResolver {
    /// Resolves the Unix group id for a project slug.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the identity service cannot be
    /// reached; absence of an id is `Ok(None)`, not an error.
    fn project_unix_gid(&self, project_slug: &str) -> Result<Option<u32>, UpstreamError>;
}
