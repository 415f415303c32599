// crates/storage-gate-providers/src/lib.rs
// ============================================================================
// Module: Storage Gate Providers Library
// Description: External collaborator clients for the mapping core.
// Purpose: Marketplace record source and Unix-identity resolution.
// Dependencies: storage-gate-core, storage-gate-config, reqwest
// ============================================================================

//! ## Overview
//! Providers implement the collaborator seams of the mapping core over real
//! transports: the blocking marketplace client fetches resource records and
//! the customer directory, and the identity resolver maps project slugs to
//! Unix group ids through an OIDC-protected API with per-client caching.
//! A deterministic mock resolver covers deployments without an identity
//! service.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod identity;
pub mod marketplace;
pub mod mock;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identity::IdentityResolver;
pub use marketplace::MarketplaceClient;
pub use mock::MockGroupIdResolver;
