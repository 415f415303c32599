// crates/storage-gate-core/src/core/record.rs
// ============================================================================
// Module: Upstream Marketplace Record
// Description: Typed view of the marketplace resource record wire format.
// Purpose: Parse loose upstream payloads into strict, defaulted structures.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The marketplace returns loosely structured resource records: optional
//! fields, numbers-as-strings, and free-form administrative overrides. This
//! module parses them into strict structures with documented defaults. The
//! mapping core never aborts on malformed *optional* input; tolerant
//! deserializers substitute defaults and move on.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Upstream Enums
// ============================================================================

/// Marketplace resource lifecycle state.
///
/// # Invariants
/// - Unrecognized wire values deserialize to `Unknown` rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResourceState {
    /// Resource provisioning in progress.
    Creating,
    /// Resource is provisioned.
    #[serde(rename = "OK")]
    Ok,
    /// Resource is in an error state.
    Erred,
    /// An update is being applied.
    Updating,
    /// Teardown in progress.
    Terminating,
    /// Teardown complete.
    Terminated,
    /// Unrecognized state value.
    #[default]
    #[serde(other)]
    Unknown,
}

impl ResourceState {
    /// Returns the upstream wire label for the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Creating => "Creating",
            Self::Ok => "OK",
            Self::Erred => "Erred",
            Self::Updating => "Updating",
            Self::Terminating => "Terminating",
            Self::Terminated => "Terminated",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage use-case classification carried in record attributes.
///
/// Drives both target-type selection and the mount-path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageDataType {
    /// Project-scoped long-term storage.
    #[default]
    Store,
    /// Project-scoped archival storage.
    Archive,
    /// Per-user home-like storage.
    Users,
    /// Per-user scratch storage.
    Scratch,
}

impl StorageDataType {
    /// Returns the lowercase wire key for the data type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Archive => "archive",
            Self::Users => "users",
            Self::Scratch => "scratch",
        }
    }
}

impl fmt::Display for StorageDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-flight order request type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderType {
    /// Provisioning order.
    Create,
    /// Quota/option update order.
    Update,
    /// Teardown order.
    Terminate,
    /// Unrecognized order type.
    #[default]
    #[serde(other)]
    Unknown,
}

/// In-flight order state, used to select callback actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderState {
    /// Waiting for provider approval.
    PendingProvider,
    /// Waiting for consumer approval.
    PendingConsumer,
    /// Being executed by the provider.
    Executing,
    /// Completed successfully.
    Done,
    /// Failed.
    Erred,
    /// Unrecognized order state.
    #[serde(other)]
    Unknown,
}

// ============================================================================
// SECTION: Record Sub-Structures
// ============================================================================

/// Base allocation limits from the marketplace plan.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Base storage allocation in terabytes; may be fractional.
    #[serde(default)]
    pub storage: f64,
}

/// Record attributes selected by the user at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAttributes {
    /// Storage use-case classification; unknown values default to `store`.
    #[serde(
        rename = "storage_data_type",
        default,
        deserialize_with = "lenient_data_type"
    )]
    pub storage_data_type: StorageDataType,
    /// Unix permission string; invalid values fall back to `"775"`.
    #[serde(default = "default_permissions", deserialize_with = "lenient_permissions")]
    pub permissions: String,
}

impl Default for ResourceAttributes {
    fn default() -> Self {
        Self {
            storage_data_type: StorageDataType::default(),
            permissions: default_permissions(),
        }
    }
}

/// Administrative per-field overrides for quotas and permissions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceOptions {
    /// Override for the soft space quota in terabytes.
    #[serde(default)]
    pub soft_quota_space: Option<f64>,
    /// Override for the hard space quota in terabytes.
    #[serde(default)]
    pub hard_quota_space: Option<f64>,
    /// Override for the soft inode quota; tolerates `10000`, `10000.0`,
    /// and `"10000"` wire forms.
    #[serde(default, deserialize_with = "loose_count")]
    pub soft_quota_inodes: Option<u64>,
    /// Override for the hard inode quota; same tolerant parsing.
    #[serde(default, deserialize_with = "loose_count")]
    pub hard_quota_inodes: Option<u64>,
    /// Override for the permission string.
    #[serde(default)]
    pub permissions: Option<String>,
}

/// In-flight order reference attached to a record.
///
/// # Invariants
/// - `attributes` carries the order's recorded `old_limits`/`old_options`/
///   `new_options` snapshots as loose JSON; snapshot parsing is tolerant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderInProgress {
    /// Order request type.
    #[serde(rename = "type", default)]
    pub order_type: OrderType,
    /// Order state.
    #[serde(default)]
    pub state: Option<OrderState>,
    /// Order URL used to derive callback actions.
    #[serde(default)]
    pub url: Option<String>,
    /// Before/after attribute snapshots recorded on the order.
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Requested limits for update orders.
    #[serde(default)]
    pub limits: Option<Map<String, Value>>,
}

// ============================================================================
// SECTION: Upstream Resource
// ============================================================================

/// One marketplace resource record, as consumed by the mapping core.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpstreamResource {
    /// Upstream resource identifier.
    #[serde(default)]
    pub uuid: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Resource slug.
    #[serde(default)]
    pub slug: String,
    /// Lifecycle state.
    #[serde(default)]
    pub state: ResourceState,
    /// Offering identifier (tenant scope).
    #[serde(default)]
    pub offering_uuid: String,
    /// Offering display name.
    #[serde(default)]
    pub offering_name: String,
    /// Offering slug; corresponds to the storage system.
    #[serde(default)]
    pub offering_slug: String,
    /// Project identifier.
    #[serde(default)]
    pub project_uuid: String,
    /// Project display name.
    #[serde(default)]
    pub project_name: String,
    /// Project slug.
    #[serde(default)]
    pub project_slug: String,
    /// Customer identifier.
    #[serde(default)]
    pub customer_uuid: String,
    /// Customer display name.
    #[serde(default)]
    pub customer_name: String,
    /// Customer slug.
    #[serde(default)]
    pub customer_slug: String,
    /// Provider slug (tenant id).
    #[serde(default)]
    pub provider_slug: String,
    /// Provider display name.
    #[serde(default)]
    pub provider_name: String,
    /// Base allocation limits.
    #[serde(default)]
    pub limits: ResourceLimits,
    /// Order-time attributes.
    #[serde(default)]
    pub attributes: ResourceAttributes,
    /// Administrative overrides.
    #[serde(default)]
    pub options: ResourceOptions,
    /// In-flight order, when one exists.
    #[serde(default)]
    pub order_in_progress: Option<OrderInProgress>,
}

impl UpstreamResource {
    /// Returns the effective permission string: option override first,
    /// then the order-time attribute.
    #[must_use]
    pub fn effective_permissions(&self) -> &str {
        self.options
            .permissions
            .as_deref()
            .unwrap_or(&self.attributes.permissions)
    }

    /// Returns callback URLs for the in-flight order, keyed as
    /// `{action}_url`, chosen by order state. Empty when no order or no
    /// order URL is present.
    #[must_use]
    pub fn callback_urls(&self) -> BTreeMap<String, String> {
        let mut urls = BTreeMap::new();
        let Some(order) = &self.order_in_progress else {
            return urls;
        };
        let Some(url) = order.url.as_deref().filter(|url| !url.is_empty()) else {
            return urls;
        };
        let actions: &[&str] = match order.state {
            Some(OrderState::PendingProvider) => &["approve_by_provider", "reject_by_provider"],
            Some(OrderState::Executing) => &["set_state_done", "set_state_erred"],
            Some(OrderState::Done) => &["set_backend_id"],
            _ => &[],
        };
        let base = url.trim_end_matches('/');
        for action in actions {
            urls.insert(format!("{action}_url"), format!("{base}/{action}/"));
        }
        urls
    }
}

// ============================================================================
// SECTION: Tolerant Deserializers
// ============================================================================

/// Serde default for permission strings.
fn default_permissions() -> String {
    "775".to_string()
}

/// Returns true when the value is a 3-4 digit octal permission string.
fn is_octal_permissions(value: &str) -> bool {
    (3..=4).contains(&value.len()) && value.bytes().all(|b| (b'0'..=b'7').contains(&b))
}

/// Deserializes a data type, substituting the default for missing, empty,
/// or unknown values.
fn lenient_data_type<'de, D>(deserializer: D) -> Result<StorageDataType, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let parsed = raw.and_then(|value| serde_json::from_value::<StorageDataType>(value).ok());
    Ok(parsed.unwrap_or_default())
}

/// Deserializes a permission string, substituting the default for values
/// that are not 3-4 octal digits.
fn lenient_permissions<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw {
        Some(value) if is_octal_permissions(&value) => value,
        _ => default_permissions(),
    })
}

/// Deserializes an optional count that may arrive as an integer, a float,
/// or a numeric string.
fn loose_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let Some(value) = raw else {
        return Ok(None);
    };
    parse_loose_count(&value)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid integer value: {value}")))
}

/// Parses a JSON value into a non-negative count, truncating fractions.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Values are filtered non-negative and truncation matches the documented floor semantics."
)]
fn parse_loose_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64)),
        Value::String(text) => text
            .parse::<f64>()
            .ok()
            .filter(|f| *f >= 0.0)
            .map(|f| f.trunc() as u64),
        _ => None,
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
    use serde_json::json;

    #[test]
    fn unknown_state_parses_as_unknown() {
        let state: ResourceState = serde_json::from_value(json!("Hibernating")).unwrap();
        assert_eq!(state, ResourceState::Unknown);
    }

    #[test]
    fn loose_counts_accept_all_wire_forms() {
        let options: ResourceOptions = serde_json::from_value(json!({
            "soft_quota_inodes": 10_000,
            "hard_quota_inodes": "20000.0",
        }))
        .unwrap();
        assert_eq!(options.soft_quota_inodes, Some(10_000));
        assert_eq!(options.hard_quota_inodes, Some(20_000));

        let float_form: ResourceOptions =
            serde_json::from_value(json!({"soft_quota_inodes": 10_000.0})).unwrap();
        assert_eq!(float_form.soft_quota_inodes, Some(10_000));
    }

    #[test]
    fn invalid_permissions_fall_back_to_default() {
        let attributes: ResourceAttributes =
            serde_json::from_value(json!({"permissions": "rwxr-xr-x"})).unwrap();
        assert_eq!(attributes.permissions, "775");
    }

    #[test]
    fn unknown_data_type_falls_back_to_store() {
        let attributes: ResourceAttributes =
            serde_json::from_value(json!({"storage_data_type": "tape"})).unwrap();
        assert_eq!(attributes.storage_data_type, StorageDataType::Store);
    }

    #[test]
    fn callback_urls_follow_order_state() {
        let resource = UpstreamResource {
            order_in_progress: Some(OrderInProgress {
                order_type: OrderType::Update,
                state: Some(OrderState::PendingProvider),
                url: Some("https://waldur.example/api/orders/42/".to_string()),
                ..OrderInProgress::default()
            }),
            ..UpstreamResource::default()
        };
        let urls = resource.callback_urls();
        assert_eq!(
            urls.get("approve_by_provider_url").map(String::as_str),
            Some("https://waldur.example/api/orders/42/approve_by_provider/")
        );
        assert_eq!(
            urls.get("reject_by_provider_url").map(String::as_str),
            Some("https://waldur.example/api/orders/42/reject_by_provider/")
        );
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn callback_urls_absent_without_order_url() {
        let resource = UpstreamResource {
            order_in_progress: Some(OrderInProgress::default()),
            ..UpstreamResource::default()
        };
        assert!(resource.callback_urls().is_empty());
    }
}
