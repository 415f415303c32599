// crates/storage-gate-config/src/lib.rs
// ============================================================================
// Module: Storage Gate Config Library
// Description: Canonical configuration model and validation.
// Purpose: Single source of truth for storage-gate.toml semantics.
// Dependencies: storage-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! `storage-gate-config` defines the configuration model for Storage Gate.
//! Loading is strict and fail-closed: size and path limits on the file,
//! every invariant checked before the configuration is handed to the
//! runtime. Violations are fatal at startup, never at mapping time.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
