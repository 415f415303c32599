// crates/storage-gate-core/src/core/mount.rs
// ============================================================================
// Module: Mount Path Generation
// Description: Hierarchical filesystem mount paths for every node level.
// Purpose: Derive stable mount paths from system, data type, and ownership.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Mount paths follow the hierarchy: every child path extends its parent
//! path by exactly one segment, so `/{system}/{data_type}/{tenant}` contains
//! `/{system}/{data_type}/{tenant}/{customer}` which contains the project
//! path.

// ============================================================================
// SECTION: Path Builders
// ============================================================================

/// Mount path for a tenant-level node.
#[must_use]
pub fn tenant_mount_point(storage_system: &str, data_type: &str, tenant_id: &str) -> String {
    format!("/{storage_system}/{data_type}/{tenant_id}")
}

/// Mount path for a customer-level node.
#[must_use]
pub fn customer_mount_point(
    storage_system: &str,
    data_type: &str,
    tenant_id: &str,
    customer: &str,
) -> String {
    format!("/{storage_system}/{data_type}/{tenant_id}/{customer}")
}

/// Mount path for a project/user leaf node.
#[must_use]
pub fn project_mount_point(
    storage_system: &str,
    data_type: &str,
    tenant_id: &str,
    customer: &str,
    project_id: &str,
) -> String {
    format!("/{storage_system}/{data_type}/{tenant_id}/{customer}/{project_id}")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_paths_extend_parent_paths() {
        let tenant = tenant_mount_point("capstor", "store", "cscs");
        let customer = customer_mount_point("capstor", "store", "cscs", "mch");
        let project = project_mount_point("capstor", "store", "cscs", "mch", "msclim");
        assert_eq!(tenant, "/capstor/store/cscs");
        assert_eq!(customer, "/capstor/store/cscs/mch");
        assert_eq!(project, "/capstor/store/cscs/mch/msclim");
        assert!(customer.starts_with(&format!("{tenant}/")));
        assert!(project.starts_with(&format!("{customer}/")));
    }
}
