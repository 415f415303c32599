// crates/storage-gate-core/src/runtime/mapper.rs
// ============================================================================
// Module: Resource Mapper
// Description: Maps one upstream record into a leaf resource descriptor.
// Purpose: Select target kind, resolve identities, and assemble the leaf.
// Dependencies: crate::core, crate::interfaces, crate::runtime::quota
// ============================================================================

//! ## Overview
//! The mapper turns a single upstream record into a fully populated leaf
//! descriptor: target kind from the record's data type, Unix group id
//! through the [`GroupIdResolver`] seam, quotas through the calculator,
//! a four-segment mount path, and lifecycle status from the record state.
//! A missing group id fails closed: the record maps to nothing and the
//! caller excludes it, leaving sibling records untouched. Resolver
//! transport failures propagate and abort the batch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::identifiers::IdScope;
use crate::core::identifiers::ItemId;
use crate::core::identifiers::placeholder_unix_uid;
use crate::core::mount::project_mount_point;
use crate::core::record::UpstreamResource;
use crate::core::resource::CustomerTargetItem;
use crate::core::resource::MountPoint;
use crate::core::resource::Permission;
use crate::core::resource::PrimaryProject;
use crate::core::resource::ProjectTargetItem;
use crate::core::resource::TenantTargetItem;
use crate::core::resource::StorageResource;
use crate::core::resource::Target;
use crate::core::resource::TargetKind;
use crate::core::resource::TargetStatus;
use crate::core::resource::UserTargetItem;
use crate::core::statemap::target_kind_for_data_type;
use crate::core::statemap::target_status_for_state;
use crate::interfaces::GroupIdResolver;
use crate::interfaces::UpstreamError;
use crate::runtime::quota::QuotaCalculator;
use crate::runtime::quota::QuotaSettings;
use crate::runtime::storage_data_type_item;
use crate::runtime::storage_file_system_item;
use crate::runtime::storage_system_item;

// ============================================================================
// SECTION: Mapper
// ============================================================================

/// Maps upstream records to leaf resource descriptors.
#[derive(Debug)]
pub struct ResourceMapper<G> {
    calculator: QuotaCalculator,
    storage_file_system: String,
    resolver: G,
}

impl<G: GroupIdResolver> ResourceMapper<G> {
    /// Creates a mapper with quota settings, the backing filesystem name,
    /// and the group-id resolver.
    #[must_use]
    pub fn new(
        settings: QuotaSettings,
        storage_file_system: impl Into<String>,
        resolver: G,
    ) -> Self {
        Self {
            calculator: QuotaCalculator::new(settings),
            storage_file_system: storage_file_system.into(),
            resolver,
        }
    }

    /// Maps one record into a leaf descriptor.
    ///
    /// Returns `Ok(None)` when the record cannot be provisioned (no group
    /// id resolved); the caller skips the record and continues the batch.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the identity service cannot be
    /// reached, which aborts the whole batch.
    pub fn map(
        &self,
        record: &UpstreamResource,
        storage_system: &str,
        parent_item_id: Option<ItemId>,
    ) -> Result<Option<StorageResource>, UpstreamError> {
        let data_type = record.attributes.storage_data_type;
        let target_kind = target_kind_for_data_type(data_type);
        let status = target_status_for_state(record.state);

        let Some(target) = self.build_target(record, target_kind, status)? else {
            return Ok(None);
        };

        let quotas = self.calculator.calculate(&record.limits, &record.options);
        let (old_quotas, new_quotas) = self.calculator.calculate_update_pair(record);

        let mount_path = project_mount_point(
            storage_system,
            data_type.as_str(),
            &record.provider_slug,
            &record.customer_slug,
            &record.project_slug,
        );

        Ok(Some(StorageResource {
            item_id: ItemId::new(record.uuid.clone()),
            status,
            mount_point: MountPoint {
                default: mount_path,
            },
            permission: Permission::octal(record.effective_permissions()),
            quotas,
            target,
            storage_system: storage_system_item(storage_system),
            storage_file_system: storage_file_system_item(&self.storage_file_system),
            storage_data_type: storage_data_type_item(data_type),
            parent_item_id,
            old_quotas,
            new_quotas,
            extra: record.callback_urls(),
        }))
    }

    /// Builds the leaf target item, resolving the project group id.
    fn build_target(
        &self,
        record: &UpstreamResource,
        target_kind: TargetKind,
        status: TargetStatus,
    ) -> Result<Option<Target>, UpstreamError> {
        match target_kind {
            TargetKind::Project => self.build_project_target(record, status),
            TargetKind::User => self.build_user_target(record, status),
            // Hierarchy nodes normally come from the builder; these arms
            // keep records mappable should the kind table ever route a
            // data type here.
            TargetKind::Tenant => Ok(Some(Target::Tenant(TenantTargetItem {
                item_id: ItemId::stable(IdScope::Tenant, &record.provider_slug),
                key: record.provider_slug.to_lowercase(),
                name: record.provider_name.clone(),
            }))),
            TargetKind::Customer => Ok(Some(Target::Customer(CustomerTargetItem {
                item_id: ItemId::stable(IdScope::Customer, &record.customer_slug),
                key: record.customer_slug.to_lowercase(),
                name: record.customer_name.clone(),
            }))),
        }
    }

    fn build_project_target(
        &self,
        record: &UpstreamResource,
        status: TargetStatus,
    ) -> Result<Option<Target>, UpstreamError> {
        let project_slug = non_empty_or(&record.project_slug, "unknown");
        let Some(unix_gid) = self.resolver.project_unix_gid(project_slug)? else {
            return Ok(None);
        };

        Ok(Some(Target::Project(ProjectTargetItem {
            item_id: ItemId::stable(IdScope::Project, &record.slug),
            key: None,
            name: record.slug.clone(),
            status,
            unix_gid,
            active: status == TargetStatus::Active,
        })))
    }

    fn build_user_target(
        &self,
        record: &UpstreamResource,
        status: TargetStatus,
    ) -> Result<Option<Target>, UpstreamError> {
        let project_slug = non_empty_or(&record.project_slug, "default-project");
        let Some(unix_gid) = self.resolver.project_unix_gid(project_slug)? else {
            return Ok(None);
        };

        // Placeholder identity synthesis until a user lookup API exists.
        let unix_uid = placeholder_unix_uid(&record.slug);
        let email = format!("user-{}@example.com", record.slug);

        Ok(Some(Target::User(UserTargetItem {
            item_id: ItemId::stable(IdScope::User, &record.slug),
            key: None,
            name: None,
            status,
            email,
            unix_uid,
            primary_project: PrimaryProject {
                name: project_slug.to_string(),
                unix_gid,
                active: status == TargetStatus::Active,
            },
            active: status == TargetStatus::Active,
        })))
    }
}

/// Substitutes a fallback for empty slugs.
fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
