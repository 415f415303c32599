// crates/storage-gate-config/tests/config_loading.rs
// ============================================================================
// Module: Configuration Loading Tests
// Description: File-based configuration loading and validation tests.
// Purpose: Validate TOML parsing, defaults, and fail-closed behavior.
// Dependencies: storage-gate-config, tempfile
// ============================================================================

//! Exercises [`storage_gate_config::StorageGateConfig::load`] against real
//! files written to a temporary directory.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;
use std::path::PathBuf;

use storage_gate_config::ConfigError;
use storage_gate_config::ResolutionMode;
use storage_gate_config::StorageGateConfig;

fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("storage-gate.toml");
    fs::write(&path, contents).expect("write config");
    (dir, path)
}

const VALID_CONFIG: &str = r#"
[server]
bind = "0.0.0.0:9000"

[marketplace]
api_url = "https://waldur.example/api/"
access_token = "secret-token"

[identity]
api_url = "https://identity.example/api/"
token_url = "https://auth.example/token"
client_id = "storage-gate"
client_secret = "oidc-secret"
mode = "lenient"

[backend]
storage_file_system = "lustre"
inode_soft_coefficient = 1.33
inode_hard_coefficient = 2.0
inode_base_multiplier = 1000000.0

[storage_systems]
capstor = "capstor-prod"
vast = "vast-prod"
"#;

#[test]
fn valid_file_loads_with_all_sections() {
    let (_dir, path) = write_config(VALID_CONFIG);
    let config = StorageGateConfig::load(Some(&path)).expect("config loads");

    assert_eq!(config.server.bind, "0.0.0.0:9000");
    assert_eq!(config.marketplace.api_url, "https://waldur.example/api/");
    assert!(config.marketplace.verify_ssl);
    assert_eq!(config.identity.mode, ResolutionMode::Lenient);
    assert_eq!(config.storage_systems.len(), 2);
    assert_eq!(
        config.offering_slugs(Some("vast")),
        Some(vec!["vast-prod".to_string()])
    );
}

#[test]
fn minimal_file_applies_defaults() {
    let (_dir, path) = write_config(
        r#"
[marketplace]
api_url = "https://waldur.example/api/"
access_token = "secret-token"

[storage_systems]
capstor = "capstor-prod"
"#,
    );
    let config = StorageGateConfig::load(Some(&path)).expect("config loads");

    assert_eq!(config.server.bind, "127.0.0.1:8080");
    assert_eq!(config.backend.storage_file_system, "lustre");
    assert_eq!(config.identity.mode, ResolutionMode::Strict);
    assert!(config.identity.api_url.is_none());
}

#[test]
fn missing_file_fails_closed() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("missing.toml");
    let err = StorageGateConfig::load(Some(&path)).expect_err("missing file");
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let (_dir, path) = write_config("not [valid toml");
    let err = StorageGateConfig::load(Some(&path)).expect_err("parse failure");
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn coefficient_inversion_fails_at_load() {
    let (_dir, path) = write_config(
        r#"
[marketplace]
api_url = "https://waldur.example/api/"
access_token = "secret-token"

[backend]
inode_soft_coefficient = 3.0
inode_hard_coefficient = 1.0

[storage_systems]
capstor = "capstor-prod"
"#,
    );
    let err = StorageGateConfig::load(Some(&path)).expect_err("invalid coefficients");
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn invalid_bind_address_fails_at_load() {
    let (_dir, path) = write_config(
        r#"
[server]
bind = "not-an-address"

[marketplace]
api_url = "https://waldur.example/api/"
access_token = "secret-token"

[storage_systems]
capstor = "capstor-prod"
"#,
    );
    let err = StorageGateConfig::load(Some(&path)).expect_err("invalid bind");
    assert!(matches!(err, ConfigError::Invalid(_)));
}
