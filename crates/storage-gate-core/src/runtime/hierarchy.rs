// crates/storage-gate-core/src/runtime/hierarchy.rs
// ============================================================================
// Module: Hierarchy Builder
// Description: Tenant and customer node synthesis with deduplication.
// Purpose: Build the upper ownership tiers once per orchestration run.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The hierarchy builder is stateful and request-scoped: it owns the
//! deduplication maps and the accumulated node list for one orchestration
//! run. Each unique `(identifier, storage system, data type)` combination
//! yields exactly one tenant node and one customer node; repeated
//! registrations return the existing identifier unchanged. Customers link
//! to the tenant registered under the same triple.
//!
//! Precondition: callers register the tenant before its customers within a
//! `(system, data type)` scope. A customer registered first keeps a null
//! parent link; the builder does not re-parent after the fact.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::identifiers::IdScope;
use crate::core::identifiers::ItemId;
use crate::core::mount::customer_mount_point;
use crate::core::mount::tenant_mount_point;
use crate::core::record::StorageDataType;
use crate::core::resource::CustomerTargetItem;
use crate::core::resource::MountPoint;
use crate::core::resource::Permission;
use crate::core::resource::StorageResource;
use crate::core::resource::Target;
use crate::core::resource::TargetStatus;
use crate::core::resource::TenantTargetItem;
use crate::interfaces::CustomerInfo;
use crate::runtime::storage_data_type_item;
use crate::runtime::storage_file_system_item;
use crate::runtime::storage_system_item;

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Request-scoped builder for tenant and customer hierarchy nodes.
///
/// # Invariants
/// - One node per unique `(identifier, system, data type)` key; first write
///   wins, later registrations with differing names are ignored.
/// - Nodes accumulate in creation order.
#[derive(Debug)]
pub struct HierarchyBuilder {
    storage_file_system: String,
    tenant_entries: BTreeMap<String, ItemId>,
    customer_entries: BTreeMap<String, ItemId>,
    hierarchy_resources: Vec<StorageResource>,
}

impl HierarchyBuilder {
    /// Creates a builder for one orchestration run.
    #[must_use]
    pub fn new(storage_file_system: impl Into<String>) -> Self {
        Self {
            storage_file_system: storage_file_system.into(),
            tenant_entries: BTreeMap::new(),
            customer_entries: BTreeMap::new(),
            hierarchy_resources: Vec::new(),
        }
    }

    /// Deduplication key shared by tenant and customer entries.
    fn dedup_key(identifier: &str, storage_system: &str, data_type: StorageDataType) -> String {
        format!("{identifier}-{storage_system}-{data_type}")
    }

    /// Registers a tenant node, or returns the existing identifier for the
    /// same `(tenant, system, data type)` combination.
    ///
    /// The supplied external identifier, when present, becomes the node id;
    /// otherwise a deterministic identifier is derived from the key.
    pub fn get_or_create_tenant(
        &mut self,
        tenant_id: &str,
        tenant_name: &str,
        storage_system: &str,
        data_type: StorageDataType,
        external_id: Option<&str>,
    ) -> ItemId {
        let tenant_key = Self::dedup_key(tenant_id, storage_system, data_type);
        if let Some(existing) = self.tenant_entries.get(&tenant_key) {
            return existing.clone();
        }

        let external_id = external_id.filter(|id| !id.is_empty());
        let tenant_item_id = external_id.map_or_else(
            || ItemId::stable(IdScope::Tenant, &tenant_key),
            ItemId::new,
        );
        let target_item_id = external_id.map_or_else(
            || ItemId::stable(IdScope::Tenant, tenant_id),
            ItemId::new,
        );

        let node = StorageResource {
            item_id: tenant_item_id.clone(),
            status: TargetStatus::Pending,
            mount_point: MountPoint {
                default: tenant_mount_point(storage_system, data_type.as_str(), tenant_id),
            },
            permission: Permission::octal("775"),
            quotas: None,
            target: Target::Tenant(TenantTargetItem {
                item_id: target_item_id,
                key: tenant_id.to_lowercase(),
                name: tenant_name.to_string(),
            }),
            storage_system: storage_system_item(storage_system),
            storage_file_system: storage_file_system_item(&self.storage_file_system),
            storage_data_type: storage_data_type_item(data_type),
            parent_item_id: None,
            old_quotas: None,
            new_quotas: None,
            extra: BTreeMap::new(),
        };

        self.hierarchy_resources.push(node);
        self.tenant_entries.insert(tenant_key, tenant_item_id.clone());
        tenant_item_id
    }

    /// Registers a customer node under the tenant sharing its `(system,
    /// data type)` scope, or returns the existing identifier.
    ///
    /// Returns `None` when the customer key or upstream item id is empty,
    /// either of which makes a valid node impossible. A customer whose
    /// tenant was never registered keeps a null parent link.
    pub fn get_or_create_customer(
        &mut self,
        customer_info: &CustomerInfo,
        storage_system: &str,
        data_type: StorageDataType,
        tenant_id: &str,
    ) -> Option<ItemId> {
        if customer_info.key.is_empty() || customer_info.item_id.is_empty() {
            return None;
        }

        let customer_key = Self::dedup_key(&customer_info.key, storage_system, data_type);
        if let Some(existing) = self.customer_entries.get(&customer_key) {
            return Some(existing.clone());
        }

        let tenant_key = Self::dedup_key(tenant_id, storage_system, data_type);
        let parent_tenant_id = self.tenant_entries.get(&tenant_key).cloned();
        let customer_item_id = customer_info.item_id.clone();

        let node = StorageResource {
            item_id: customer_item_id.clone(),
            status: TargetStatus::Pending,
            mount_point: MountPoint {
                default: customer_mount_point(
                    storage_system,
                    data_type.as_str(),
                    tenant_id,
                    &customer_info.key,
                ),
            },
            permission: Permission::octal("775"),
            quotas: None,
            target: Target::Customer(CustomerTargetItem {
                item_id: customer_item_id.clone(),
                key: customer_info.key.clone(),
                name: customer_info.name.clone(),
            }),
            storage_system: storage_system_item(storage_system),
            storage_file_system: storage_file_system_item(&self.storage_file_system),
            storage_data_type: storage_data_type_item(data_type),
            parent_item_id: parent_tenant_id,
            old_quotas: None,
            new_quotas: None,
            extra: BTreeMap::new(),
        };

        self.hierarchy_resources.push(node);
        self.customer_entries
            .insert(customer_key, customer_item_id.clone());
        Some(customer_item_id)
    }

    /// Looks up the identifier of a registered customer. Pure lookup, no
    /// mutation.
    #[must_use]
    pub fn customer_item_id(
        &self,
        customer_slug: &str,
        storage_system: &str,
        data_type: StorageDataType,
    ) -> Option<ItemId> {
        let customer_key = Self::dedup_key(customer_slug, storage_system, data_type);
        self.customer_entries.get(&customer_key).cloned()
    }

    /// Links a leaf descriptor to its registered customer, when one exists.
    /// An unregistered customer leaves the leaf's parent link untouched.
    pub fn assign_parent(
        &self,
        leaf: &mut StorageResource,
        customer_slug: &str,
        storage_system: &str,
        data_type: StorageDataType,
    ) {
        if let Some(customer_id) = self.customer_item_id(customer_slug, storage_system, data_type)
        {
            leaf.assign_parent(customer_id);
        }
    }

    /// Returns a copy of the accumulated hierarchy nodes in creation order.
    #[must_use]
    pub fn hierarchy_resources(&self) -> Vec<StorageResource> {
        self.hierarchy_resources.clone()
    }

    /// Clears all builder state for reuse across independent batches.
    pub fn reset(&mut self) {
        self.tenant_entries.clear();
        self.customer_entries.clear();
        self.hierarchy_resources.clear();
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

    fn customer(key: &str, name: &str) -> CustomerInfo {
        CustomerInfo {
            item_id: ItemId::stable(IdScope::Customer, key),
            key: key.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn tenant_registration_is_idempotent() {
        let mut builder = HierarchyBuilder::new("lustre");
        let first = builder.get_or_create_tenant(
            "cscs",
            "CSCS",
            "capstor",
            StorageDataType::Store,
            None,
        );
        let second = builder.get_or_create_tenant(
            "cscs",
            "Different Name",
            "capstor",
            StorageDataType::Store,
            Some("ignored-external-id"),
        );
        let third = builder.get_or_create_tenant(
            "cscs",
            "Yet Another",
            "capstor",
            StorageDataType::Store,
            None,
        );
        assert_eq!(first, second);
        assert_eq!(first, third);
        assert_eq!(builder.hierarchy_resources().len(), 1);
    }

    #[test]
    fn tenant_nodes_differ_per_data_type() {
        let mut builder = HierarchyBuilder::new("lustre");
        let store = builder.get_or_create_tenant(
            "cscs",
            "CSCS",
            "capstor",
            StorageDataType::Store,
            None,
        );
        let scratch = builder.get_or_create_tenant(
            "cscs",
            "CSCS",
            "capstor",
            StorageDataType::Scratch,
            None,
        );
        assert_ne!(store, scratch);
        assert_eq!(builder.hierarchy_resources().len(), 2);
    }

    #[test]
    fn external_tenant_id_passes_through() {
        let mut builder = HierarchyBuilder::new("lustre");
        let id = builder.get_or_create_tenant(
            "cscs",
            "CSCS",
            "capstor",
            StorageDataType::Store,
            Some("offering-uuid-1"),
        );
        assert_eq!(id.as_str(), "offering-uuid-1");
    }

    #[test]
    fn customer_links_to_registered_tenant() {
        let mut builder = HierarchyBuilder::new("lustre");
        let tenant_id = builder.get_or_create_tenant(
            "cscs",
            "CSCS",
            "capstor",
            StorageDataType::Store,
            None,
        );
        let customer_id = builder
            .get_or_create_customer(
                &customer("mch", "MeteoSwiss"),
                "capstor",
                StorageDataType::Store,
                "cscs",
            )
            .expect("customer id");

        let nodes = builder.hierarchy_resources();
        let customer_node = nodes
            .iter()
            .find(|node| node.item_id == customer_id)
            .expect("customer node");
        assert_eq!(customer_node.parent_item_id.as_ref(), Some(&tenant_id));
        assert_eq!(
            customer_node.mount_point.default,
            "/capstor/store/cscs/mch"
        );
    }

    #[test]
    fn customer_without_tenant_stays_orphaned() {
        let mut builder = HierarchyBuilder::new("lustre");
        let customer_id = builder
            .get_or_create_customer(
                &customer("mch", "MeteoSwiss"),
                "capstor",
                StorageDataType::Store,
                "cscs",
            )
            .expect("customer id");
        let nodes = builder.hierarchy_resources();
        let customer_node = nodes
            .iter()
            .find(|node| node.item_id == customer_id)
            .expect("customer node");
        assert!(customer_node.parent_item_id.is_none());
    }

    #[test]
    fn empty_customer_key_is_rejected() {
        let mut builder = HierarchyBuilder::new("lustre");
        let result = builder.get_or_create_customer(
            &customer("", "Nameless"),
            "capstor",
            StorageDataType::Store,
            "cscs",
        );
        assert!(result.is_none());
        assert!(builder.hierarchy_resources().is_empty());
    }

    #[test]
    fn empty_customer_item_id_is_rejected() {
        let mut builder = HierarchyBuilder::new("lustre");
        let info = CustomerInfo {
            item_id: ItemId::new(""),
            key: "mch".to_string(),
            name: "MeteoSwiss".to_string(),
        };
        let result =
            builder.get_or_create_customer(&info, "capstor", StorageDataType::Store, "cscs");
        assert!(result.is_none());
        assert!(builder.hierarchy_resources().is_empty());
    }

    #[test]
    fn reset_clears_all_state() {
        let mut builder = HierarchyBuilder::new("lustre");
        builder.get_or_create_tenant("cscs", "CSCS", "capstor", StorageDataType::Store, None);
        builder.get_or_create_customer(
            &customer("mch", "MeteoSwiss"),
            "capstor",
            StorageDataType::Store,
            "cscs",
        );
        builder.reset();
        assert!(builder.hierarchy_resources().is_empty());
        assert!(builder
            .customer_item_id("mch", "capstor", StorageDataType::Store)
            .is_none());
    }
}
