// crates/atlas-gate-credentials/src/store.rs
// ============================================================================
// Module: Secret Store Collaborator
// Description: Optional OS secret store interface for the middle lookup tier.
// Purpose: Keep the resolver free of a hard dependency on any secret backend.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The secret store is a capability-checked optional collaborator: the
//! resolver holds an `Option<Box<dyn SecretStore>>` and treats an absent
//! store identically to a lookup miss. Lookups are best-effort by contract:
//! a store that cannot answer returns `None` rather than an error, matching
//! the behavior of platform keychain helpers that exit non-zero on a miss.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

// ============================================================================
// SECTION: Secret Store Trait
// ============================================================================

/// Best-effort lookup of a serialized credential payload by service name.
pub trait SecretStore {
    /// Returns the stored payload for a service, or `None` on any miss.
    fn lookup(&self, service: &str) -> Option<String>;
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Deterministic in-memory store used in tests and embedding scenarios.
#[derive(Debug, Clone, Default)]
pub struct InMemorySecretStore {
    /// Stored payloads keyed by service name.
    entries: BTreeMap<String, String>,
}

impl InMemorySecretStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a payload for a service, replacing any existing entry.
    pub fn insert(&mut self, service: impl Into<String>, payload: impl Into<String>) {
        self.entries.insert(service.into(), payload.into());
    }
}

impl SecretStore for InMemorySecretStore {
    fn lookup(&self, service: &str) -> Option<String> {
        self.entries.get(service).cloned()
    }
}
