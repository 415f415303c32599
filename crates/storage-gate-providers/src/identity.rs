// crates/storage-gate-providers/src/identity.rs
// ============================================================================
// Module: Identity Resolver
// Description: Unix group id resolution through the identity API.
// Purpose: Resolve project slugs to GIDs with OIDC auth and caching.
// Dependencies: storage-gate-core, storage-gate-config, reqwest
// ============================================================================

//! ## Overview
//! The identity resolver implements [`GroupIdResolver`] over the HPC user
//! API: a client-credentials token is fetched from the OIDC endpoint and
//! reused until shortly before expiry, and resolved group ids are cached
//! per client. Lookup misses behave per the configured mode: strict
//! propagates `Ok(None)` so the affected record fails closed, lenient
//! substitutes the deterministic placeholder id. Transport failures are
//! [`UpstreamError::Identity`] in both modes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use reqwest::blocking::Client;
use serde::Deserialize;
use storage_gate_config::IdentityConfig;
use storage_gate_config::ResolutionMode;
use storage_gate_core::GroupIdResolver;
use storage_gate_core::UpstreamError;
use storage_gate_core::placeholder_unix_gid;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Request timeout for identity API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Default token lifetime when the OIDC response omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3_600;
/// Safety margin subtracted from the token lifetime.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 300;

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Cached OIDC token with its refresh deadline.
#[derive(Debug, Clone)]
struct CachedToken {
    /// Bearer token value.
    token: String,
    /// Instant after which the token must be refreshed.
    refresh_after: Instant,
}

/// Unix group id resolver backed by the identity API.
#[derive(Debug)]
pub struct IdentityResolver {
    client: Client,
    api_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    mode: ResolutionMode,
    token: Mutex<Option<CachedToken>>,
    gid_cache: Mutex<BTreeMap<String, u32>>,
}

impl IdentityResolver {
    /// Creates a resolver from identity configuration.
    ///
    /// The configuration must carry an API URL and the OIDC fields; the
    /// config layer validates this before construction.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Identity`] when the configuration is
    /// incomplete or the HTTP client cannot be constructed.
    pub fn new(config: &IdentityConfig) -> Result<Self, UpstreamError> {
        let api_url = required(config.api_url.as_deref(), "identity.api_url")?;
        let token_url = required(config.token_url.as_deref(), "identity.token_url")?;
        let client_id = required(config.client_id.as_deref(), "identity.client_id")?;
        let client_secret = required(config.client_secret.as_deref(), "identity.client_secret")?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| UpstreamError::Identity(err.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token_url,
            client_id,
            client_secret,
            scope: config.scope.clone().unwrap_or_else(|| "openid".to_string()),
            mode: config.mode,
            token: Mutex::new(None),
            gid_cache: Mutex::new(BTreeMap::new()),
        })
    }

    /// Returns a valid bearer token, refreshing through the OIDC endpoint
    /// when the cached one is missing or near expiry.
    fn auth_token(&self) -> Result<String, UpstreamError> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| UpstreamError::Identity("token cache poisoned".to_string()))?;
        if let Some(cached) = slot.as_ref() {
            if Instant::now() < cached.refresh_after {
                return Ok(cached.token.clone());
            }
        }

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .map_err(|err| UpstreamError::Identity(err.to_string()))?;
        if !response.status().is_success() {
            return Err(UpstreamError::Identity(format!(
                "token endpoint returned status {}",
                response.status()
            )));
        }
        let token_response: TokenResponse = response
            .json()
            .map_err(|err| UpstreamError::Identity(err.to_string()))?;
        if token_response.access_token.is_empty() {
            return Err(UpstreamError::Identity(
                "no access_token in OIDC response".to_string(),
            ));
        }

        let lifetime = token_response
            .expires_in
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        let safe_lifetime = lifetime
            .saturating_sub(TOKEN_EXPIRY_MARGIN_SECS)
            .max(TOKEN_EXPIRY_MARGIN_SECS);
        let token = token_response.access_token;
        *slot = Some(CachedToken {
            token: token.clone(),
            refresh_after: Instant::now() + Duration::from_secs(safe_lifetime),
        });
        Ok(token)
    }

    /// Queries the identity API for a project's records.
    fn fetch_projects(&self, project_slug: &str) -> Result<Vec<ProjectRecord>, UpstreamError> {
        let token = self.auth_token()?;
        let url = format!("{}/api/v1/export/waldur/projects", self.api_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {token}"))
            .query(&[("projects", project_slug)])
            .send()
            .map_err(|err| UpstreamError::Identity(err.to_string()))?;
        if !response.status().is_success() {
            return Err(UpstreamError::Identity(format!(
                "{url} returned status {}",
                response.status()
            )));
        }
        let listing: ProjectListing = response
            .json()
            .map_err(|err| UpstreamError::Identity(err.to_string()))?;
        Ok(listing.projects)
    }

    /// Applies the configured mode to a lookup miss.
    fn lookup_miss(&self, project_slug: &str) -> Option<u32> {
        match self.mode {
            ResolutionMode::Strict => None,
            ResolutionMode::Lenient => Some(placeholder_unix_gid(project_slug)),
        }
    }
}

impl GroupIdResolver for IdentityResolver {
    fn project_unix_gid(&self, project_slug: &str) -> Result<Option<u32>, UpstreamError> {
        {
            let cache = self
                .gid_cache
                .lock()
                .map_err(|_| UpstreamError::Identity("gid cache poisoned".to_string()))?;
            if let Some(gid) = cache.get(project_slug) {
                return Ok(Some(*gid));
            }
        }

        let projects = self.fetch_projects(project_slug)?;
        // An ambiguous listing is as unusable as a missing one.
        let [project] = projects.as_slice() else {
            return Ok(self.lookup_miss(project_slug));
        };
        let resolved = (project.posix_name == project_slug)
            .then_some(project.unix_gid)
            .flatten();

        match resolved {
            Some(gid) => {
                let mut cache = self
                    .gid_cache
                    .lock()
                    .map_err(|_| UpstreamError::Identity("gid cache poisoned".to_string()))?;
                cache.insert(project_slug.to_string(), gid);
                Ok(Some(gid))
            }
            None => Ok(self.lookup_miss(project_slug)),
        }
    }
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// OIDC token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    /// Bearer token value.
    #[serde(default)]
    access_token: String,
    /// Token lifetime in seconds.
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Identity API project listing.
#[derive(Debug, Deserialize)]
struct ProjectListing {
    /// Matching project records.
    #[serde(default)]
    projects: Vec<ProjectRecord>,
}

/// One project record from the identity API.
#[derive(Debug, Deserialize)]
struct ProjectRecord {
    /// Posix name; must match the queried slug exactly.
    #[serde(rename = "posixName", default)]
    posix_name: String,
    /// Unix group id, when assigned.
    #[serde(rename = "unixGid", default)]
    unix_gid: Option<u32>,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Requires a configuration field to be present and non-empty.
fn required(value: Option<&str>, field: &str) -> Result<String, UpstreamError> {
    match value {
        Some(set) if !set.trim().is_empty() => Ok(set.to_string()),
        _ => Err(UpstreamError::Identity(format!("{field} is required"))),
    }
}
