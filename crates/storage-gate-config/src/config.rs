// crates/storage-gate-config/src/config.rs
// ============================================================================
// Module: Storage Gate Configuration
// Description: Configuration loading and validation for Storage Gate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: storage-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path
//! limits. The quota coefficients, upstream endpoints, and storage-system
//! table are validated at load time; invalid configuration fails closed
//! before any request is served.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use storage_gate_core::QuotaSettings;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "storage-gate.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "STORAGE_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default server bind address.
const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Default backing filesystem name.
const DEFAULT_FILE_SYSTEM: &str = "lustre";
/// Default soft inode coefficient.
const DEFAULT_INODE_SOFT_COEFFICIENT: f64 = 1.33;
/// Default hard inode coefficient.
const DEFAULT_INODE_HARD_COEFFICIENT: f64 = 2.0;
/// Default inodes granted per terabyte.
const DEFAULT_INODE_BASE_MULTIPLIER: f64 = 1_000_000.0;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Storage Gate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageGateConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream marketplace API configuration.
    pub marketplace: MarketplaceConfig,
    /// Unix-identity service configuration.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Quota derivation and filesystem settings.
    #[serde(default)]
    pub backend: BackendSettings,
    /// Storage system key to marketplace offering slug.
    #[serde(default)]
    pub storage_systems: BTreeMap<String, String>,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address, `host:port`.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Upstream marketplace API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketplaceConfig {
    /// Base API URL.
    pub api_url: String,
    /// Bearer token for the marketplace API.
    pub access_token: String,
    /// Whether to verify upstream TLS certificates.
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
}

/// Identity resolution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Missing group ids exclude the affected record.
    #[default]
    Strict,
    /// Missing group ids substitute a deterministic placeholder.
    Lenient,
}

/// Unix-identity service configuration.
///
/// When `api_url` is absent the providers crate falls back to the
/// deterministic mock resolver, regardless of mode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfig {
    /// Identity API base URL; absent selects the mock resolver.
    #[serde(default)]
    pub api_url: Option<String>,
    /// OIDC token endpoint for client-credentials auth.
    #[serde(default)]
    pub token_url: Option<String>,
    /// OIDC client identifier.
    #[serde(default)]
    pub client_id: Option<String>,
    /// OIDC client secret.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// OIDC scope requested with the token.
    #[serde(default)]
    pub scope: Option<String>,
    /// Resolution mode for missing group ids.
    #[serde(default)]
    pub mode: ResolutionMode,
}

/// Quota derivation and filesystem settings.
///
/// # Invariants
/// - `inode_hard_coefficient >= inode_soft_coefficient`, enforced by
///   [`BackendSettings::validate`].
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    /// Backing filesystem name, e.g. `"lustre"`.
    #[serde(default = "default_file_system")]
    pub storage_file_system: String,
    /// Soft inode threshold as a fraction of the inode base.
    #[serde(default = "default_inode_soft_coefficient")]
    pub inode_soft_coefficient: f64,
    /// Hard inode threshold as a fraction of the inode base.
    #[serde(default = "default_inode_hard_coefficient")]
    pub inode_hard_coefficient: f64,
    /// Inodes granted per terabyte of allocation.
    #[serde(default = "default_inode_base_multiplier")]
    pub inode_base_multiplier: f64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            storage_file_system: default_file_system(),
            inode_soft_coefficient: DEFAULT_INODE_SOFT_COEFFICIENT,
            inode_hard_coefficient: DEFAULT_INODE_HARD_COEFFICIENT,
            inode_base_multiplier: DEFAULT_INODE_BASE_MULTIPLIER,
        }
    }
}

impl BackendSettings {
    /// Returns the quota settings consumed by the mapping runtime.
    #[must_use]
    pub const fn quota_settings(&self) -> QuotaSettings {
        QuotaSettings {
            inode_base_multiplier: self.inode_base_multiplier,
            inode_soft_coefficient: self.inode_soft_coefficient,
            inode_hard_coefficient: self.inode_hard_coefficient,
        }
    }

    /// Validates quota coefficients and the filesystem name.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_file_system.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "backend.storage_file_system must be non-empty".to_string(),
            ));
        }
        if self.inode_soft_coefficient <= 0.0 || !self.inode_soft_coefficient.is_finite() {
            return Err(ConfigError::Invalid(
                "backend.inode_soft_coefficient must be a positive number".to_string(),
            ));
        }
        if self.inode_hard_coefficient <= 0.0 || !self.inode_hard_coefficient.is_finite() {
            return Err(ConfigError::Invalid(
                "backend.inode_hard_coefficient must be a positive number".to_string(),
            ));
        }
        if self.inode_hard_coefficient < self.inode_soft_coefficient {
            return Err(ConfigError::Invalid(format!(
                "backend.inode_hard_coefficient {} must not be smaller than \
                 inode_soft_coefficient {}",
                self.inode_hard_coefficient, self.inode_soft_coefficient
            )));
        }
        if self.inode_base_multiplier <= 0.0 || !self.inode_base_multiplier.is_finite() {
            return Err(ConfigError::Invalid(
                "backend.inode_base_multiplier must be a positive number".to_string(),
            ));
        }
        Ok(())
    }
}

impl StorageGateConfig {
    /// Loads configuration from disk using the default resolution rules:
    /// explicit path, then the `STORAGE_GATE_CONFIG` environment variable,
    /// then `storage-gate.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_marketplace()?;
        self.validate_identity()?;
        self.backend.validate()?;
        self.validate_storage_systems()?;
        Ok(())
    }

    /// Returns the offering slugs to query for a storage-system filter.
    ///
    /// `None` for an unconfigured system; all configured slugs when no
    /// filter is given.
    #[must_use]
    pub fn offering_slugs(&self, storage_system: Option<&str>) -> Option<Vec<String>> {
        match storage_system {
            Some(system) => self
                .storage_systems
                .get(system)
                .map(|slug| vec![slug.clone()]),
            None => Some(self.storage_systems.values().cloned().collect()),
        }
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        self.server
            .bind
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid("server.bind must be a socket address".to_string()))?;
        Ok(())
    }

    fn validate_marketplace(&self) -> Result<(), ConfigError> {
        validate_api_url("marketplace.api_url", &self.marketplace.api_url)?;
        if self.marketplace.access_token.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "marketplace.access_token must be non-empty".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_identity(&self) -> Result<(), ConfigError> {
        let Some(api_url) = &self.identity.api_url else {
            return Ok(());
        };
        validate_api_url("identity.api_url", api_url)?;
        for (field, value) in [
            ("identity.token_url", &self.identity.token_url),
            ("identity.client_id", &self.identity.client_id),
            ("identity.client_secret", &self.identity.client_secret),
        ] {
            match value {
                Some(set) if !set.trim().is_empty() => {}
                _ => {
                    return Err(ConfigError::Invalid(format!(
                        "{field} must be set when identity.api_url is configured"
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_storage_systems(&self) -> Result<(), ConfigError> {
        if self.storage_systems.is_empty() {
            return Err(ConfigError::Invalid(
                "storage_systems must define at least one system".to_string(),
            ));
        }
        for (system, slug) in &self.storage_systems {
            if system.trim().is_empty() || slug.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "storage_systems keys and offering slugs must be non-empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Serde default for the server bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Serde default for the backing filesystem.
fn default_file_system() -> String {
    DEFAULT_FILE_SYSTEM.to_string()
}

/// Serde default for the soft inode coefficient.
const fn default_inode_soft_coefficient() -> f64 {
    DEFAULT_INODE_SOFT_COEFFICIENT
}

/// Serde default for the hard inode coefficient.
const fn default_inode_hard_coefficient() -> f64 {
    DEFAULT_INODE_HARD_COEFFICIENT
}

/// Serde default for the inode base multiplier.
const fn default_inode_base_multiplier() -> f64 {
    DEFAULT_INODE_BASE_MULTIPLIER
}

/// Serde default helper for booleans that default on.
const fn default_true() -> bool {
    true
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates that an API URL is non-empty and uses an http scheme.
fn validate_api_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(ConfigError::Invalid(format!("{field} must be an http(s) URL")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
