// crates/storage-gate-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: Batch Orchestrator
// Description: Drives fetch, hierarchy construction, and mapping per batch.
// Purpose: Coordinate the collaborators and the runtime over one request.
// Dependencies: crate::core, crate::interfaces, crate::runtime
// ============================================================================

//! ## Overview
//! The orchestrator owns one batch: it fetches a page of upstream records,
//! prefetches the customer directory per distinct offering scope, registers
//! every tenant and customer node in a first pass, then maps each leaf
//! independently with its parent resolved from the completed hierarchy.
//! Hierarchy nodes precede leaves in the output. Post-mapping filters by
//! data type and status run over the combined list, so a hierarchy node
//! survives filtering only when it matches the filters itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::core::record::ResourceState;
use crate::core::record::StorageDataType;
use crate::core::record::UpstreamResource;
use crate::core::resource::StorageResource;
use crate::core::resource::TargetStatus;
use crate::interfaces::CustomerDirectory;
use crate::interfaces::CustomerInfo;
use crate::interfaces::GroupIdResolver;
use crate::interfaces::RecordQuery;
use crate::interfaces::RecordSource;
use crate::interfaces::UpstreamError;
use crate::runtime::hierarchy::HierarchyBuilder;
use crate::runtime::mapper::ResourceMapper;
use crate::runtime::quota::QuotaSettings;

// ============================================================================
// SECTION: Filter
// ============================================================================

/// Default page size for a batch request.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Maximum page size accepted for a batch request.
pub const MAX_PAGE_SIZE: usize = 500;

/// Request-scoped filter and pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFilter {
    /// Upstream state filter, forwarded to the marketplace query.
    pub state: Option<ResourceState>,
    /// Post-mapping data-type filter.
    pub data_type: Option<StorageDataType>,
    /// Post-mapping status filter.
    pub status: Option<TargetStatus>,
    /// Page number, 1-based.
    pub page: usize,
    /// Page size, `1..=MAX_PAGE_SIZE`.
    pub page_size: usize,
}

impl Default for ResourceFilter {
    fn default() -> Self {
        Self {
            state: None,
            data_type: None,
            status: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One orchestrated batch: the mapped resources plus the upstream total for
/// pagination.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrchestratorOutput {
    /// Hierarchy nodes followed by leaf descriptors, post-filter.
    pub resources: Vec<StorageResource>,
    /// Total records matching the query upstream, pre-filter.
    pub total: usize,
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Coordinates record fetching, hierarchy construction, and leaf mapping.
#[derive(Debug)]
pub struct Orchestrator<S, D, G> {
    source: S,
    customers: D,
    mapper: ResourceMapper<G>,
    storage_file_system: String,
}

impl<S, D, G> Orchestrator<S, D, G>
where
    S: RecordSource,
    D: CustomerDirectory,
    G: GroupIdResolver,
{
    /// Creates an orchestrator over the given collaborators.
    #[must_use]
    pub fn new(
        source: S,
        customers: D,
        resolver: G,
        settings: QuotaSettings,
        storage_file_system: impl Into<String>,
    ) -> Self {
        let storage_file_system = storage_file_system.into();
        Self {
            source,
            customers,
            mapper: ResourceMapper::new(settings, storage_file_system.clone(), resolver),
            storage_file_system,
        }
    }

    /// Fetches one page of records for the given offering slugs and maps
    /// them into the linked hierarchy.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the marketplace or identity service
    /// cannot be reached; per-record mapping failures skip the record
    /// instead.
    pub fn get_resources(
        &self,
        offering_slugs: &[String],
        filter: &ResourceFilter,
    ) -> Result<OrchestratorOutput, UpstreamError> {
        let query = RecordQuery {
            offering_slugs: offering_slugs.to_vec(),
            state: filter.state,
            page: filter.page,
            page_size: filter.page_size,
        };
        let page = self.source.list_records(&query)?;

        let mapped = if page.records.is_empty() {
            Vec::new()
        } else {
            self.process_records(&page.records)?
        };

        let resources = filter_resources(mapped, filter.data_type, filter.status);
        Ok(OrchestratorOutput {
            resources,
            total: page.total,
        })
    }

    /// Two-pass batch processing: hierarchy registration, then leaf mapping.
    fn process_records(
        &self,
        records: &[UpstreamResource],
    ) -> Result<Vec<StorageResource>, UpstreamError> {
        let directory = self.prefetch_customers(records)?;
        let mut builder = HierarchyBuilder::new(&self.storage_file_system);

        // Pass one: register every tenant and customer node so parent
        // lookups during leaf mapping see the completed hierarchy.
        for record in records {
            let storage_system = &record.offering_slug;
            let data_type = record.attributes.storage_data_type;
            let tenant_id = &record.provider_slug;
            let tenant_name = if record.provider_name.is_empty() {
                tenant_id.to_uppercase()
            } else {
                record.provider_name.clone()
            };
            let external_id =
                (!record.offering_uuid.is_empty()).then_some(record.offering_uuid.as_str());

            builder.get_or_create_tenant(
                tenant_id,
                &tenant_name,
                storage_system,
                data_type,
                external_id,
            );

            if let Some(customer_info) = directory.get(&record.customer_slug) {
                builder.get_or_create_customer(
                    customer_info,
                    storage_system,
                    data_type,
                    tenant_id,
                );
            }
        }

        // Pass two: map each leaf independently; a failed leaf is skipped
        // without touching its siblings.
        let mut leaves = Vec::new();
        for record in records {
            let storage_system = &record.offering_slug;
            let data_type = record.attributes.storage_data_type;
            let parent_item_id =
                builder.customer_item_id(&record.customer_slug, storage_system, data_type);

            if let Some(leaf) = self.mapper.map(record, storage_system, parent_item_id)? {
                leaves.push(leaf);
            }
        }

        let mut resources = builder.hierarchy_resources();
        resources.append(&mut leaves);
        Ok(resources)
    }

    /// Fetches the customer directory once per distinct offering scope in
    /// the batch.
    fn prefetch_customers(
        &self,
        records: &[UpstreamResource],
    ) -> Result<BTreeMap<String, CustomerInfo>, UpstreamError> {
        let offering_uuids: BTreeSet<&str> = records
            .iter()
            .map(|record| record.offering_uuid.as_str())
            .filter(|uuid| !uuid.is_empty())
            .collect();

        let mut directory = BTreeMap::new();
        for offering_uuid in offering_uuids {
            directory.extend(self.customers.offering_customers(offering_uuid)?);
        }
        Ok(directory)
    }
}

/// Applies the post-mapping data-type and status predicates.
fn filter_resources(
    resources: Vec<StorageResource>,
    data_type: Option<StorageDataType>,
    status: Option<TargetStatus>,
) -> Vec<StorageResource> {
    if data_type.is_none() && status.is_none() {
        return resources;
    }
    resources
        .into_iter()
        .filter(|resource| {
            data_type.is_none_or(|wanted| resource.storage_data_type.key == wanted.as_str())
        })
        .filter(|resource| status.is_none_or(|wanted| resource.status == wanted))
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
