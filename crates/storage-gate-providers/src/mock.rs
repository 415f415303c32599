// crates/storage-gate-providers/src/mock.rs
// ============================================================================
// Module: Mock Group Id Resolver
// Description: Deterministic resolver for deployments without an identity API.
// Purpose: Provide placeholder or fail-closed resolution per mode.
// Dependencies: storage-gate-core, storage-gate-config
// ============================================================================

//! ## Overview
//! When no identity API is configured, the mock resolver stands in for the
//! real one: lenient mode synthesizes deterministic placeholder group ids,
//! strict mode resolves nothing so every leaf fails closed. It never
//! performs I/O and never fails.

// ============================================================================
// SECTION: Imports
// ============================================================================

use storage_gate_config::ResolutionMode;
use storage_gate_core::GroupIdResolver;
use storage_gate_core::UpstreamError;
use storage_gate_core::placeholder_unix_gid;

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Deterministic group id resolver without an identity API.
#[derive(Debug, Clone, Copy)]
pub struct MockGroupIdResolver {
    mode: ResolutionMode,
}

impl MockGroupIdResolver {
    /// Creates a mock resolver with the given mode.
    #[must_use]
    pub const fn new(mode: ResolutionMode) -> Self {
        Self { mode }
    }
}

impl GroupIdResolver for MockGroupIdResolver {
    fn project_unix_gid(&self, project_slug: &str) -> Result<Option<u32>, UpstreamError> {
        match self.mode {
            ResolutionMode::Strict => Ok(None),
            ResolutionMode::Lenient => Ok(Some(placeholder_unix_gid(project_slug))),
        }
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

    #[test]
    fn lenient_mode_synthesizes_stable_ids() {
        let resolver = MockGroupIdResolver::new(ResolutionMode::Lenient);
        let first = resolver.project_unix_gid("msclim").expect("no transport");
        let second = resolver.project_unix_gid("msclim").expect("no transport");
        assert_eq!(first, second);
        let gid = first.expect("lenient always resolves");
        assert!((30_000..40_000).contains(&gid));
    }

    #[test]
    fn strict_mode_resolves_nothing() {
        let resolver = MockGroupIdResolver::new(ResolutionMode::Strict);
        assert_eq!(resolver.project_unix_gid("msclim").expect("no transport"), None);
    }
}
