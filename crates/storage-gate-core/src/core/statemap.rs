// crates/storage-gate-core/src/core/statemap.rs
// ============================================================================
// Module: State and Status Mapping Tables
// Description: Total tables between upstream states and lifecycle statuses.
// Purpose: Map record states, statuses, and data types without failing.
// Dependencies: crate::core::{record, resource}
// ============================================================================

//! ## Overview
//! Fixed, total mapping tables. Unknown inputs map to documented safe
//! defaults; nothing in this module can fail. The reverse status-to-state
//! table exists for feedback into the upstream system and has no entry for
//! the `unknown` status.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::record::ResourceState;
use crate::core::record::StorageDataType;
use crate::core::resource::TargetKind;
use crate::core::resource::TargetStatus;

// ============================================================================
// SECTION: Mapping Tables
// ============================================================================

/// Maps an upstream record state to a lifecycle status.
///
/// Total: unknown states map to `Pending`.
#[must_use]
pub const fn target_status_for_state(state: ResourceState) -> TargetStatus {
    match state {
        ResourceState::Creating | ResourceState::Unknown => TargetStatus::Pending,
        ResourceState::Ok => TargetStatus::Active,
        ResourceState::Erred => TargetStatus::Error,
        ResourceState::Updating => TargetStatus::Updating,
        ResourceState::Terminating => TargetStatus::Removing,
        ResourceState::Terminated => TargetStatus::Removed,
    }
}

/// Maps a lifecycle status back to the upstream record state.
///
/// `Unknown` has no reverse mapping.
#[must_use]
pub const fn resource_state_for_status(status: TargetStatus) -> Option<ResourceState> {
    match status {
        TargetStatus::Pending => Some(ResourceState::Creating),
        TargetStatus::Active => Some(ResourceState::Ok),
        TargetStatus::Error => Some(ResourceState::Erred),
        TargetStatus::Updating => Some(ResourceState::Updating),
        TargetStatus::Removing => Some(ResourceState::Terminating),
        TargetStatus::Removed => Some(ResourceState::Terminated),
        TargetStatus::Unknown => None,
    }
}

/// Maps a storage data type to the leaf target kind it produces.
///
/// Store and archive allocations provision projects; users and scratch
/// allocations provision users.
#[must_use]
pub const fn target_kind_for_data_type(data_type: StorageDataType) -> TargetKind {
    match data_type {
        StorageDataType::Store | StorageDataType::Archive => TargetKind::Project,
        StorageDataType::Users | StorageDataType::Scratch => TargetKind::User,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
