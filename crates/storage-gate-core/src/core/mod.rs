// crates/storage-gate-core/src/core/mod.rs
// ============================================================================
// Module: Storage Gate Core Types
// Description: Canonical descriptor, record, and identifier structures.
// Purpose: Provide stable, serializable types for storage resource mapping.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! Core types define the resource descriptor returned to quota-provisioning
//! callers, the upstream marketplace record consumed from the wire, the
//! deterministic identifier scheme, filesystem mount paths, and the total
//! state/status mapping tables. These types are the canonical source of truth
//! for any derived API surfaces.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod identifiers;
pub mod mount;
pub mod record;
pub mod resource;
pub mod statemap;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identifiers::IdScope;
pub use identifiers::ItemId;
pub use identifiers::placeholder_unix_gid;
pub use identifiers::placeholder_unix_uid;
pub use mount::customer_mount_point;
pub use mount::project_mount_point;
pub use mount::tenant_mount_point;
pub use record::OrderInProgress;
pub use record::OrderState;
pub use record::OrderType;
pub use record::ResourceAttributes;
pub use record::ResourceLimits;
pub use record::ResourceOptions;
pub use record::ResourceState;
pub use record::StorageDataType;
pub use record::UpstreamResource;
pub use resource::CustomerTargetItem;
pub use resource::EnforcementType;
pub use resource::MountPoint;
pub use resource::Permission;
pub use resource::PrimaryProject;
pub use resource::ProjectTargetItem;
pub use resource::Quota;
pub use resource::QuotaType;
pub use resource::QuotaUnit;
pub use resource::StorageItem;
pub use resource::StorageResource;
pub use resource::Target;
pub use resource::TargetKind;
pub use resource::TargetStatus;
pub use resource::TenantTargetItem;
pub use resource::UserTargetItem;
pub use statemap::resource_state_for_status;
pub use statemap::target_kind_for_data_type;
pub use statemap::target_status_for_state;
