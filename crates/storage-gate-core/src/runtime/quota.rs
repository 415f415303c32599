// crates/storage-gate-core/src/runtime/quota.rs
// ============================================================================
// Module: Quota Calculator
// Description: Space and inode quota derivation from allocations and options.
// Purpose: Compute quota sets and before/after pairs for update orders.
// Dependencies: crate::core, serde_json
// ============================================================================

//! ## Overview
//! Quota sets are derived from the base storage allocation (terabytes, may
//! be fractional) layered with administrative overrides. Inode quotas scale
//! from the allocation through a configured multiplier and soft/hard
//! coefficients. A leaf whose effective space quotas are both non-positive
//! has no quota set at all. For records carrying an in-flight update order,
//! the calculator also renders the before/after pair from the order's
//! recorded snapshots; malformed snapshot data degrades to no pair rather
//! than failing the record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::core::record::OrderType;
use crate::core::record::ResourceLimits;
use crate::core::record::ResourceOptions;
use crate::core::record::UpstreamResource;
use crate::core::resource::EnforcementType;
use crate::core::resource::Quota;
use crate::core::resource::QuotaType;
use crate::core::resource::QuotaUnit;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Inode derivation settings, fixed at configuration load.
///
/// # Invariants
/// - `inode_hard_coefficient >= inode_soft_coefficient`, validated by the
///   configuration layer before construction, not here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaSettings {
    /// Inodes granted per terabyte of allocation.
    pub inode_base_multiplier: f64,
    /// Soft inode threshold as a fraction of the inode base.
    pub inode_soft_coefficient: f64,
    /// Hard inode threshold as a fraction of the inode base.
    pub inode_hard_coefficient: f64,
}

impl Default for QuotaSettings {
    fn default() -> Self {
        Self {
            inode_base_multiplier: 1_000_000.0,
            inode_soft_coefficient: 1.33,
            inode_hard_coefficient: 2.0,
        }
    }
}

// ============================================================================
// SECTION: Calculator
// ============================================================================

/// Derives quota sets from allocations and overrides.
#[derive(Debug, Clone, Copy)]
pub struct QuotaCalculator {
    settings: QuotaSettings,
}

impl QuotaCalculator {
    /// Creates a calculator with the given settings.
    #[must_use]
    pub const fn new(settings: QuotaSettings) -> Self {
        Self { settings }
    }

    /// Computes the four-entry quota set for an allocation.
    ///
    /// Soft space is the base allocation; hard space honors the option
    /// override. Inode quotas scale from the allocation unless overridden.
    /// Returns `None` when both effective space values are non-positive,
    /// which marks a leaf without any allocation.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        reason = "Inode bases are floored by truncation and re-widened for the uniform float schema."
    )]
    pub fn calculate(
        &self,
        limits: &ResourceLimits,
        options: &ResourceOptions,
    ) -> Option<Vec<Quota>> {
        let storage_limit = limits.storage;

        let space_soft = storage_limit;
        let space_hard = options.hard_quota_space.unwrap_or(storage_limit);

        let base_inodes = storage_limit * self.settings.inode_base_multiplier;
        let base_soft_inodes = (base_inodes * self.settings.inode_soft_coefficient).trunc();
        let base_hard_inodes = (base_inodes * self.settings.inode_hard_coefficient).trunc();

        let inode_soft = options
            .soft_quota_inodes
            .map_or(base_soft_inodes, |count| count as f64);
        let inode_hard = options
            .hard_quota_inodes
            .map_or(base_hard_inodes, |count| count as f64);

        if space_soft <= 0.0 && space_hard <= 0.0 {
            return None;
        }

        Some(vec![
            Quota {
                quota_type: QuotaType::Space,
                quota: space_soft,
                unit: QuotaUnit::Tera,
                enforcement_type: EnforcementType::Soft,
            },
            Quota {
                quota_type: QuotaType::Space,
                quota: space_hard,
                unit: QuotaUnit::Tera,
                enforcement_type: EnforcementType::Hard,
            },
            Quota {
                quota_type: QuotaType::Inodes,
                quota: inode_soft,
                unit: QuotaUnit::None,
                enforcement_type: EnforcementType::Soft,
            },
            Quota {
                quota_type: QuotaType::Inodes,
                quota: inode_hard,
                unit: QuotaUnit::None,
                enforcement_type: EnforcementType::Hard,
            },
        ])
    }

    /// Computes the before/after quota pair for a record's in-flight update
    /// order.
    ///
    /// Applies only to `update`-type orders. The old side layers the order's
    /// recorded `old_limits`/`old_options` snapshots over the record; the
    /// new side uses the order's own `limits` plus the `new_options`
    /// snapshot. When no snapshot contributes anything, or snapshot data is
    /// malformed, the pair is `(None, None)` and the record maps normally.
    #[must_use]
    pub fn calculate_update_pair(
        &self,
        record: &UpstreamResource,
    ) -> (Option<Vec<Quota>>, Option<Vec<Quota>>) {
        let Some(order) = &record.order_in_progress else {
            return (None, None);
        };
        if order.order_type != OrderType::Update || order.attributes.is_empty() {
            return (None, None);
        }

        let attributes = &order.attributes;
        let has_limit_update = attributes.contains_key("old_limits");
        let has_option_update =
            attributes.contains_key("old_options") || attributes.contains_key("new_options");

        let mut old_limits = None;
        let mut new_limits = None;
        let mut old_options = None;
        let mut new_options = None;

        if has_limit_update {
            old_limits = parse_snapshot::<ResourceLimits>(attributes.get("old_limits"));
            new_limits = order
                .limits
                .as_ref()
                .and_then(|limits| parse_snapshot::<ResourceLimits>(Some(&Value::Object(limits.clone()))));
        }
        if has_option_update {
            old_options = parse_snapshot::<ResourceOptions>(attributes.get("old_options"));
            new_options = parse_snapshot::<ResourceOptions>(attributes.get("new_options"));
        }

        if old_limits.is_none()
            && new_limits.is_none()
            && old_options.is_none()
            && new_options.is_none()
        {
            return (None, None);
        }

        let old_quotas = self.calculate(
            old_limits.as_ref().unwrap_or(&record.limits),
            old_options.as_ref().unwrap_or(&record.options),
        );
        let new_quotas = self.calculate(
            new_limits.as_ref().unwrap_or(&record.limits),
            new_options.as_ref().unwrap_or(&record.options),
        );

        (old_quotas, new_quotas)
    }
}

/// Parses an order snapshot value, treating absent, empty, or malformed
/// snapshots as no contribution.
fn parse_snapshot<T>(value: Option<&Value>) -> Option<T>
where
    T: serde::de::DeserializeOwned,
{
    let object: &Map<String, Value> = value?.as_object()?;
    if object.is_empty() {
        return None;
    }
    serde_json::from_value(Value::Object(object.clone())).ok()
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
    use crate::core::record::OrderInProgress;
    use serde_json::json;

    fn settings(multiplier: f64, soft: f64, hard: f64) -> QuotaSettings {
        QuotaSettings {
            inode_base_multiplier: multiplier,
            inode_soft_coefficient: soft,
            inode_hard_coefficient: hard,
        }
    }

    fn entry(quotas: &[Quota], quota_type: QuotaType, enforcement: EnforcementType) -> f64 {
        quotas
            .iter()
            .find(|q| q.quota_type == quota_type && q.enforcement_type == enforcement)
            .expect("quota entry present")
            .quota
    }

    #[test]
    fn zero_allocation_yields_no_quotas() {
        let calculator = QuotaCalculator::new(QuotaSettings::default());
        let quotas = calculator.calculate(
            &ResourceLimits { storage: 0.0 },
            &ResourceOptions::default(),
        );
        assert!(quotas.is_none());
    }

    #[test]
    fn one_terabyte_worked_example() {
        let calculator = QuotaCalculator::new(settings(1_000_000.0, 0.9, 1.0));
        let quotas = calculator
            .calculate(&ResourceLimits { storage: 1.0 }, &ResourceOptions::default())
            .expect("quota set");
        assert_eq!(quotas.len(), 4);
        assert!(
            (entry(&quotas, QuotaType::Space, EnforcementType::Soft) - 1.0).abs() < f64::EPSILON
        );
        assert!(
            (entry(&quotas, QuotaType::Space, EnforcementType::Hard) - 1.0).abs() < f64::EPSILON
        );
        assert!(
            (entry(&quotas, QuotaType::Inodes, EnforcementType::Soft) - 900_000.0).abs()
                < f64::EPSILON
        );
        assert!(
            (entry(&quotas, QuotaType::Inodes, EnforcementType::Hard) - 1_000_000.0).abs()
                < f64::EPSILON
        );
        assert!(quotas
            .iter()
            .filter(|q| q.quota_type == QuotaType::Space)
            .all(|q| q.unit == QuotaUnit::Tera));
    }

    #[test]
    fn hard_space_override_leaves_soft_space_alone() {
        let calculator = QuotaCalculator::new(QuotaSettings::default());
        let options = ResourceOptions {
            hard_quota_space: Some(15.0),
            ..ResourceOptions::default()
        };
        let quotas = calculator
            .calculate(&ResourceLimits { storage: 10.0 }, &options)
            .expect("quota set");
        assert!(
            (entry(&quotas, QuotaType::Space, EnforcementType::Soft) - 10.0).abs() < f64::EPSILON
        );
        assert!(
            (entry(&quotas, QuotaType::Space, EnforcementType::Hard) - 15.0).abs() < f64::EPSILON
        );
    }

    #[test]
    fn inode_overrides_take_precedence() {
        let calculator = QuotaCalculator::new(QuotaSettings::default());
        let options = ResourceOptions {
            soft_quota_inodes: Some(111),
            hard_quota_inodes: Some(222),
            ..ResourceOptions::default()
        };
        let quotas = calculator
            .calculate(&ResourceLimits { storage: 2.0 }, &options)
            .expect("quota set");
        assert!(
            (entry(&quotas, QuotaType::Inodes, EnforcementType::Soft) - 111.0).abs()
                < f64::EPSILON
        );
        assert!(
            (entry(&quotas, QuotaType::Inodes, EnforcementType::Hard) - 222.0).abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn update_pair_reflects_old_and_new_limits() {
        let calculator = QuotaCalculator::new(settings(1_000_000.0, 0.5, 1.0));
        let mut attributes = Map::new();
        attributes.insert("old_limits".to_string(), json!({"storage": 1.0}));
        let mut new_limits = Map::new();
        new_limits.insert("storage".to_string(), json!(2.0));
        let record = UpstreamResource {
            limits: ResourceLimits { storage: 2.0 },
            order_in_progress: Some(OrderInProgress {
                order_type: OrderType::Update,
                attributes,
                limits: Some(new_limits),
                ..OrderInProgress::default()
            }),
            ..UpstreamResource::default()
        };

        let (old_quotas, new_quotas) = calculator.calculate_update_pair(&record);
        let old_quotas = old_quotas.expect("old quota set");
        let new_quotas = new_quotas.expect("new quota set");
        assert!(
            (entry(&old_quotas, QuotaType::Inodes, EnforcementType::Hard) - 1_000_000.0).abs()
                < f64::EPSILON
        );
        assert!(
            (entry(&new_quotas, QuotaType::Inodes, EnforcementType::Hard) - 2_000_000.0).abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn non_update_orders_yield_no_pair() {
        let calculator = QuotaCalculator::new(QuotaSettings::default());
        let mut attributes = Map::new();
        attributes.insert("old_limits".to_string(), json!({"storage": 1.0}));
        let record = UpstreamResource {
            limits: ResourceLimits { storage: 2.0 },
            order_in_progress: Some(OrderInProgress {
                order_type: OrderType::Create,
                attributes,
                ..OrderInProgress::default()
            }),
            ..UpstreamResource::default()
        };
        assert_eq!(calculator.calculate_update_pair(&record), (None, None));
    }

    #[test]
    fn malformed_snapshots_degrade_to_no_pair() {
        let calculator = QuotaCalculator::new(QuotaSettings::default());
        let mut attributes = Map::new();
        attributes.insert("old_limits".to_string(), json!("not-an-object"));
        let record = UpstreamResource {
            limits: ResourceLimits { storage: 2.0 },
            order_in_progress: Some(OrderInProgress {
                order_type: OrderType::Update,
                attributes,
                ..OrderInProgress::default()
            }),
            ..UpstreamResource::default()
        };
        assert_eq!(calculator.calculate_update_pair(&record), (None, None));
    }
}
