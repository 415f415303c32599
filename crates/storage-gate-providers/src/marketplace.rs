// crates/storage-gate-providers/src/marketplace.rs
// ============================================================================
// Module: Marketplace Client
// Description: Blocking client for the upstream marketplace API.
// Purpose: Fetch resource records and the customer directory per offering.
// Dependencies: storage-gate-core, storage-gate-config, reqwest
// ============================================================================

//! ## Overview
//! The marketplace client implements [`RecordSource`] and
//! [`CustomerDirectory`] over the upstream REST API. Record listings carry
//! the page of records in the body and the total match count in the
//! `X-Result-Count` response header. All failures surface as
//! [`UpstreamError::Marketplace`]; nothing here degrades per record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use storage_gate_config::MarketplaceConfig;
use storage_gate_core::CustomerDirectory;
use storage_gate_core::CustomerInfo;
use storage_gate_core::ItemId;
use storage_gate_core::RecordPage;
use storage_gate_core::RecordQuery;
use storage_gate_core::RecordSource;
use storage_gate_core::UpstreamError;
use storage_gate_core::UpstreamResource;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Request timeout for marketplace calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);
/// Response header carrying the total match count.
const RESULT_COUNT_HEADER: &str = "X-Result-Count";

// ============================================================================
// SECTION: Client
// ============================================================================

/// Blocking client for the upstream marketplace API.
#[derive(Debug)]
pub struct MarketplaceClient {
    client: Client,
    api_url: String,
    access_token: String,
}

impl MarketplaceClient {
    /// Creates a client from marketplace configuration.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Marketplace`] when the HTTP client cannot
    /// be constructed.
    pub fn new(config: &MarketplaceConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|err| UpstreamError::Marketplace(err.to_string()))?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    /// Issues an authenticated GET and checks the response status.
    fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::blocking::Response, UpstreamError> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Token {}", self.access_token))
            .query(query)
            .send()
            .map_err(|err| UpstreamError::Marketplace(err.to_string()))?;
        if !response.status().is_success() {
            return Err(UpstreamError::Marketplace(format!(
                "{url} returned status {}",
                response.status()
            )));
        }
        Ok(response)
    }
}

impl RecordSource for MarketplaceClient {
    fn list_records(&self, query: &RecordQuery) -> Result<RecordPage, UpstreamError> {
        let url = format!("{}/marketplace-resources/", self.api_url);
        let mut params: Vec<(&str, String)> = vec![
            ("exclude_pending_transitional", "true".to_string()),
            ("page", query.page.to_string()),
            ("page_size", query.page_size.to_string()),
        ];
        if !query.offering_slugs.is_empty() {
            params.push(("offering_slug", query.offering_slugs.join(",")));
        }
        if let Some(state) = query.state {
            params.push(("state", state.as_str().to_string()));
        }

        let response = self.get(&url, &params)?;
        let total = response
            .headers()
            .get(RESULT_COUNT_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<usize>().ok());
        let records: Vec<UpstreamResource> = response
            .json()
            .map_err(|err| UpstreamError::Marketplace(err.to_string()))?;
        let total = total.unwrap_or(records.len());

        Ok(RecordPage { records, total })
    }
}

impl CustomerDirectory for MarketplaceClient {
    fn offering_customers(
        &self,
        offering_uuid: &str,
    ) -> Result<BTreeMap<String, CustomerInfo>, UpstreamError> {
        let url = format!(
            "{}/marketplace-provider-offerings/{offering_uuid}/customers/",
            self.api_url
        );
        let response = self.get(&url, &[])?;
        let customers: Vec<UpstreamCustomer> = response
            .json()
            .map_err(|err| UpstreamError::Marketplace(err.to_string()))?;

        Ok(customers
            .into_iter()
            .map(|customer| {
                (
                    customer.slug.clone(),
                    CustomerInfo {
                        item_id: ItemId::new(customer.uuid),
                        key: customer.slug,
                        name: customer.name,
                    },
                )
            })
            .collect())
    }
}

/// Wire shape of one customer in the offering customer listing.
#[derive(Debug, Deserialize)]
struct UpstreamCustomer {
    /// Upstream customer identifier.
    #[serde(default)]
    uuid: String,
    /// Customer slug.
    #[serde(default)]
    slug: String,
    /// Display name.
    #[serde(default)]
    name: String,
}
