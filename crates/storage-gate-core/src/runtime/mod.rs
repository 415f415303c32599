// crates/storage-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: Storage Gate Runtime
// Description: Quota calculation, hierarchy construction, and mapping engine.
// Purpose: Turn flat upstream records into the linked ownership hierarchy.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The runtime is the batch engine: the quota calculator derives space and
//! inode quota sets from base allocations plus overrides, the hierarchy
//! builder synthesizes and deduplicates tenant/customer nodes, the resource
//! mapper turns one record into a leaf descriptor, and the orchestrator
//! drives all three over a fetched batch. Everything here is synchronous;
//! the only I/O happens behind the collaborator traits in
//! [`crate::interfaces`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod hierarchy;
pub mod mapper;
pub mod orchestrator;
pub mod quota;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use hierarchy::HierarchyBuilder;
pub use mapper::ResourceMapper;
pub use orchestrator::DEFAULT_PAGE_SIZE;
pub use orchestrator::MAX_PAGE_SIZE;
pub use orchestrator::Orchestrator;
pub use orchestrator::OrchestratorOutput;
pub use orchestrator::ResourceFilter;
pub use quota::QuotaCalculator;
pub use quota::QuotaSettings;

// ============================================================================
// SECTION: Shared Construction Helpers
// ============================================================================

use crate::core::identifiers::IdScope;
use crate::core::identifiers::ItemId;
use crate::core::record::StorageDataType;
use crate::core::resource::StorageItem;

/// Builds the storage-system classification item for a system key.
pub(crate) fn storage_system_item(storage_system: &str) -> StorageItem {
    StorageItem {
        item_id: ItemId::stable(IdScope::StorageSystem, storage_system),
        key: storage_system.to_lowercase(),
        name: storage_system.to_uppercase(),
        active: true,
        path: String::new(),
    }
}

/// Builds the storage-filesystem classification item for a filesystem key.
pub(crate) fn storage_file_system_item(file_system: &str) -> StorageItem {
    StorageItem {
        item_id: ItemId::stable(IdScope::StorageFileSystem, file_system),
        key: file_system.to_lowercase(),
        name: file_system.to_uppercase(),
        active: true,
        path: String::new(),
    }
}

/// Builds the storage-data-type classification item; the data-type key
/// doubles as the mount-path segment.
pub(crate) fn storage_data_type_item(data_type: StorageDataType) -> StorageItem {
    let key = data_type.as_str();
    StorageItem {
        item_id: ItemId::stable(IdScope::StorageDataType, key),
        key: key.to_string(),
        name: key.to_uppercase(),
        active: true,
        path: key.to_string(),
    }
}
