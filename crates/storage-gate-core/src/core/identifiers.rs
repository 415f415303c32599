// crates/storage-gate-core/src/core/identifiers.rs
// ============================================================================
// Module: Storage Gate Identifiers
// Description: Deterministic, stable identifiers for hierarchy nodes.
// Purpose: Provide namespace-hashed item identifiers with stable wire forms.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! This module defines the identifier scheme used throughout Storage Gate.
//! Item identifiers are echoed back to callers on every request and must not
//! flap between runs, so every identifier not supplied by the upstream system
//! is derived deterministically from a `(scope, name)` pair via UUIDv5 over
//! the OID namespace. No randomness, no time dependency.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

// ============================================================================
// SECTION: Identifier Scopes
// ============================================================================

/// Scope under which a stable identifier is generated.
///
/// # Invariants
/// - Scope labels are stable wire constants; changing one changes every
///   identifier derived under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdScope {
    /// Tenant hierarchy nodes and tenant target items.
    Tenant,
    /// Customer target items.
    Customer,
    /// Project target items.
    Project,
    /// User target items.
    User,
    /// Storage system classification nodes.
    StorageSystem,
    /// Storage filesystem classification nodes.
    StorageFileSystem,
    /// Storage data-type classification nodes.
    StorageDataType,
}

impl IdScope {
    /// Returns the stable scope label used in identifier derivation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tenant => "tenant",
            Self::Customer => "customer",
            Self::Project => "project",
            Self::User => "user",
            Self::StorageSystem => "storage_system",
            Self::StorageFileSystem => "storage_file_system",
            Self::StorageDataType => "storage_data_type",
        }
    }
}

impl fmt::Display for IdScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Item Identifier
// ============================================================================

/// Item identifier carried by every resource descriptor and target item.
///
/// # Invariants
/// - Opaque UTF-8 string; externally supplied identifiers pass through
///   unchanged, synthesized identifiers are hyphenated UUIDv5 strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Creates an item identifier from an externally supplied value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives a deterministic identifier from a scope and name.
    ///
    /// Same `(scope, identifier)` always yields the same output, including
    /// across process restarts.
    #[must_use]
    pub fn stable(scope: IdScope, identifier: &str) -> Self {
        Self(scoped_uuid(scope, identifier).to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the identifier is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Derivation Helpers
// ============================================================================

/// Derives the UUIDv5 for a `(scope, identifier)` pair over the OID namespace.
fn scoped_uuid(scope: IdScope, identifier: &str) -> Uuid {
    let name = format!("{scope}:{identifier}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

/// Derives a bounded numeric offset from the stable UUID of a slug.
///
/// Used for placeholder Unix identities until an authoritative lookup API is
/// wired in; stable across runs, unlike a seeded process hash.
fn stable_offset(scope: IdScope, slug: &str) -> u32 {
    let bytes = scoped_uuid(scope, slug).into_bytes();
    let word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    word % 10_000
}

/// Returns a deterministic placeholder Unix group id for a project slug.
///
/// Placeholder integration point: used only by lenient identity resolution
/// when no identity service is configured.
#[must_use]
pub fn placeholder_unix_gid(project_slug: &str) -> u32 {
    30_000 + stable_offset(IdScope::Project, project_slug)
}

/// Returns a deterministic placeholder Unix user id for a user slug.
///
/// Placeholder integration point: user identities have no authoritative
/// lookup yet; see the user target construction in the resource mapper.
#[must_use]
pub fn placeholder_unix_uid(user_slug: &str) -> u32 {
    20_000 + stable_offset(IdScope::User, user_slug)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
