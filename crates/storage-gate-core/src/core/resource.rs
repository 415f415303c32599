// crates/storage-gate-core/src/core/resource.rs
// ============================================================================
// Module: Storage Resource Descriptor
// Description: Resource descriptor returned to quota-provisioning callers.
// Purpose: Provide the wire-stable hierarchy node and quota structures.
// Dependencies: serde, crate::core::identifiers
// ============================================================================

//! ## Overview
//! A [`StorageResource`] describes one node of the ownership hierarchy:
//! tenant, customer, or a leaf (project/user) carrying quotas and Unix
//! identity bindings. Target items are a tagged sum type so invalid field
//! combinations are unrepresentable. Descriptors are immutable after
//! construction except for the controlled parent-link assignment performed
//! by the hierarchy builder.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ItemId;

// ============================================================================
// SECTION: Quotas
// ============================================================================

/// Quota dimension.
///
/// # Invariants
/// - Variants are stable wire constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaType {
    /// Storage space in the configured unit.
    Space,
    /// Inode count.
    Inodes,
}

/// Unit attached to a quota value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaUnit {
    /// Terabytes (space quotas).
    Tera,
    /// Unitless (inode quotas).
    None,
}

/// Enforcement threshold for a quota entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementType {
    /// Advisory threshold.
    Soft,
    /// Hard limit.
    Hard,
}

/// A single quota entry on a leaf node.
///
/// # Invariants
/// - `quota` is a floating-point value even for inode counts, for schema
///   uniformity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quota {
    /// Quota dimension.
    #[serde(rename = "type")]
    pub quota_type: QuotaType,
    /// Quota value.
    pub quota: f64,
    /// Value unit.
    pub unit: QuotaUnit,
    /// Enforcement threshold.
    #[serde(rename = "enforcementType")]
    pub enforcement_type: EnforcementType,
}

// ============================================================================
// SECTION: Lifecycle Status
// ============================================================================

/// Lifecycle status of a hierarchy node.
///
/// # Invariants
/// - Variants are stable wire constants; `Unknown` never round-trips back to
///   an upstream record state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    /// Provisioning not yet complete.
    Pending,
    /// Provisioned and usable.
    Active,
    /// Teardown in progress.
    Removing,
    /// Teardown complete.
    Removed,
    /// Upstream reported an error.
    Error,
    /// An update order is being applied.
    Updating,
    /// Status could not be determined.
    Unknown,
}

impl TargetStatus {
    /// Returns the stable wire label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Removing => "removing",
            Self::Removed => "removed",
            Self::Error => "error",
            Self::Updating => "updating",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Structural Pieces
// ============================================================================

/// Octal permission string with its encoding tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Octal permission string, e.g. `"775"`.
    pub value: String,
    /// Encoding tag; always `"octal"`.
    #[serde(rename = "permissionType")]
    pub permission_type: String,
}

impl Permission {
    /// Creates an octal permission from a value string.
    #[must_use]
    pub fn octal(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            permission_type: "octal".to_string(),
        }
    }
}

/// Filesystem mount location for a hierarchy node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountPoint {
    /// Default absolute mount path.
    pub default: String,
}

/// Storage classification item (system, filesystem, or data type).
///
/// # Invariants
/// - `item_id` is deterministic for a given `(scope, key)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageItem {
    /// Stable item identifier.
    #[serde(rename = "itemId")]
    pub item_id: ItemId,
    /// Lowercase lookup key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Whether the classification item is active.
    #[serde(default = "default_true")]
    pub active: bool,
    /// Optional path segment (used for data types).
    #[serde(default)]
    pub path: String,
}

/// Serde default helper for `StorageItem::active`.
const fn default_true() -> bool {
    true
}

// ============================================================================
// SECTION: Target Items
// ============================================================================

/// Tenant target attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantTargetItem {
    /// Stable item identifier.
    #[serde(rename = "itemId")]
    pub item_id: ItemId,
    /// Lowercase tenant key.
    pub key: String,
    /// Display name.
    pub name: String,
}

/// Customer target attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerTargetItem {
    /// Stable item identifier.
    #[serde(rename = "itemId")]
    pub item_id: ItemId,
    /// Customer slug.
    pub key: String,
    /// Display name.
    pub name: String,
}

/// Project target attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTargetItem {
    /// Stable item identifier.
    #[serde(rename = "itemId")]
    pub item_id: ItemId,
    /// Always absent for project items in this schema.
    pub key: Option<String>,
    /// Project slug.
    pub name: String,
    /// Lifecycle status of the project.
    pub status: TargetStatus,
    /// Resolved Unix group id.
    #[serde(rename = "unixGid")]
    pub unix_gid: u32,
    /// True iff `status == active`.
    pub active: bool,
}

/// Primary project binding carried by user targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryProject {
    /// Project slug.
    pub name: String,
    /// Resolved Unix group id of the project.
    #[serde(rename = "unixGid")]
    pub unix_gid: u32,
    /// Whether the project is active.
    pub active: bool,
}

/// User target attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTargetItem {
    /// Stable item identifier.
    #[serde(rename = "itemId")]
    pub item_id: ItemId,
    /// Always absent for user items in this schema.
    pub key: Option<String>,
    /// Always absent for user items in this schema.
    pub name: Option<String>,
    /// Lifecycle status of the user allocation.
    pub status: TargetStatus,
    /// Contact email (placeholder synthesis).
    pub email: String,
    /// Unix user id (placeholder synthesis).
    #[serde(rename = "unixUid")]
    pub unix_uid: u32,
    /// Primary project binding.
    #[serde(rename = "primaryProject")]
    pub primary_project: PrimaryProject,
    /// True iff `status == active`.
    pub active: bool,
}

/// Target kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Top-level ownership node.
    Tenant,
    /// Mid-level ownership node.
    Customer,
    /// Project leaf node.
    Project,
    /// User leaf node.
    User,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Tenant => "tenant",
            Self::Customer => "customer",
            Self::Project => "project",
            Self::User => "user",
        };
        f.write_str(label)
    }
}

/// Target discriminated union: one variant per target type, each carrying
/// only its own fields.
///
/// # Invariants
/// - Serializes as `{"targetType": ..., "targetItem": {...}}` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "targetType", content = "targetItem", rename_all = "lowercase")]
pub enum Target {
    /// Tenant node target.
    Tenant(TenantTargetItem),
    /// Customer node target.
    Customer(CustomerTargetItem),
    /// Project leaf target.
    Project(ProjectTargetItem),
    /// User leaf target.
    User(UserTargetItem),
}

impl Target {
    /// Returns the target kind discriminant.
    #[must_use]
    pub const fn kind(&self) -> TargetKind {
        match self {
            Self::Tenant(_) => TargetKind::Tenant,
            Self::Customer(_) => TargetKind::Customer,
            Self::Project(_) => TargetKind::Project,
            Self::User(_) => TargetKind::User,
        }
    }
}

// ============================================================================
// SECTION: Resource Descriptor
// ============================================================================

/// One node of the ownership hierarchy as returned to the caller.
///
/// # Invariants
/// - A customer's non-null `parent_item_id` references a tenant node in the
///   same result set; a leaf's references a customer node.
/// - `quotas` is `Some` only on leaf nodes with non-zero effective
///   allocation; tenant and customer nodes always carry `None`.
/// - Immutable after construction except for [`StorageResource::assign_parent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageResource {
    /// Stable node identifier.
    #[serde(rename = "itemId")]
    pub item_id: ItemId,
    /// Lifecycle status.
    pub status: TargetStatus,
    /// Filesystem mount location.
    #[serde(rename = "mountPoint")]
    pub mount_point: MountPoint,
    /// Permission settings.
    pub permission: Permission,
    /// Quota entries; absent on hierarchy nodes and zero-allocation leaves.
    pub quotas: Option<Vec<Quota>>,
    /// Target item for this node.
    pub target: Target,
    /// Storage system classification.
    #[serde(rename = "storageSystem")]
    pub storage_system: StorageItem,
    /// Storage filesystem classification.
    #[serde(rename = "storageFileSystem")]
    pub storage_file_system: StorageItem,
    /// Storage data-type classification.
    #[serde(rename = "storageDataType")]
    pub storage_data_type: StorageItem,
    /// Identifier of the immediate ancestor node, when linked.
    #[serde(rename = "parentItemId")]
    pub parent_item_id: Option<ItemId>,
    /// Quotas in effect before an in-flight update order, when one exists.
    #[serde(rename = "oldQuotas", skip_serializing_if = "Option::is_none", default)]
    pub old_quotas: Option<Vec<Quota>>,
    /// Quotas requested by an in-flight update order, when one exists.
    #[serde(rename = "newQuotas", skip_serializing_if = "Option::is_none", default)]
    pub new_quotas: Option<Vec<Quota>>,
    /// Opaque passthrough fields (callback URLs) merged at the top level;
    /// omitted entirely when absent.
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty", default)]
    pub extra: BTreeMap<String, String>,
}

impl StorageResource {
    /// Links this node to its parent. This is the only mutation permitted
    /// after construction.
    pub fn assign_parent(&mut self, parent: ItemId) {
        self.parent_item_id = Some(parent);
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        clippy::unwrap_used,
        reason = "Test assertions use expect/unwrap for clarity."
    )]

    use super::*;
    use crate::core::identifiers::IdScope;

    #[test]
    fn target_serializes_with_type_tag() {
        let target = Target::Tenant(TenantTargetItem {
            item_id: ItemId::stable(IdScope::Tenant, "cscs"),
            key: "cscs".to_string(),
            name: "CSCS".to_string(),
        });
        let value = serde_json::to_value(&target).unwrap();
        assert_eq!(value["targetType"], "tenant");
        assert_eq!(value["targetItem"]["key"], "cscs");
    }

    #[test]
    fn extra_fields_are_flattened_and_omitted_when_empty() {
        let resource = StorageResource {
            item_id: ItemId::new("res-1"),
            status: TargetStatus::Active,
            mount_point: MountPoint {
                default: "/capstor/store/cscs".to_string(),
            },
            permission: Permission::octal("775"),
            quotas: None,
            target: Target::Tenant(TenantTargetItem {
                item_id: ItemId::new("t-1"),
                key: "cscs".to_string(),
                name: "CSCS".to_string(),
            }),
            storage_system: StorageItem {
                item_id: ItemId::stable(IdScope::StorageSystem, "capstor"),
                key: "capstor".to_string(),
                name: "CAPSTOR".to_string(),
                active: true,
                path: String::new(),
            },
            storage_file_system: StorageItem {
                item_id: ItemId::stable(IdScope::StorageFileSystem, "lustre"),
                key: "lustre".to_string(),
                name: "LUSTRE".to_string(),
                active: true,
                path: String::new(),
            },
            storage_data_type: StorageItem {
                item_id: ItemId::stable(IdScope::StorageDataType, "store"),
                key: "store".to_string(),
                name: "STORE".to_string(),
                active: true,
                path: "store".to_string(),
            },
            parent_item_id: None,
            old_quotas: None,
            new_quotas: None,
            extra: BTreeMap::new(),
        };
        let value = serde_json::to_value(&resource).unwrap();
        assert!(value.get("approve_by_provider_url").is_none());
        assert!(value.get("quotas").is_some_and(serde_json::Value::is_null));

        let mut with_extra = resource;
        with_extra.extra.insert(
            "approve_by_provider_url".to_string(),
            "https://waldur.example/api/orders/1/approve_by_provider/".to_string(),
        );
        let value = serde_json::to_value(&with_extra).unwrap();
        assert_eq!(
            value["approve_by_provider_url"],
            "https://waldur.example/api/orders/1/approve_by_provider/"
        );
    }
}
