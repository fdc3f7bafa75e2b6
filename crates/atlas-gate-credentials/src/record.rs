// crates/atlas-gate-credentials/src/record.rs
// ============================================================================
// Module: Credential Record
// Description: Resolved secret bundle and its source tier.
// Purpose: Carry credential fields from resolution to a single gateway call.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A resolved credential is an immutable bundle of string fields plus the
//! tier that supplied it. Records live for one gateway call and are never
//! persisted or logged; the `Debug` form hides field values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// SECTION: Source Tier
// ============================================================================

/// Which of the three ordered lookup mechanisms supplied a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTier {
    /// Process environment variable.
    Environment,
    /// OS-level secret store.
    Keychain,
    /// Local configuration file.
    File,
}

impl SourceTier {
    /// Returns the stable label for this tier.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::Keychain => "keychain",
            Self::File => "file",
        }
    }
}

// ============================================================================
// SECTION: Credential Record
// ============================================================================

/// A named secret bundle resolved for one service.
///
/// # Invariants
/// - Exactly one `source` is reported per resolution.
/// - The record is immutable once resolved; there is no caching or refresh
///   contract beyond process lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    /// Service name the record was resolved for.
    pub service: String,
    /// Credential fields (host, port, user, password, or a single token).
    pub fields: BTreeMap<String, String>,
    /// Tier that supplied the record.
    pub source: SourceTier,
}

impl CredentialRecord {
    /// Returns a field value by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Field values stay out of Debug output so they cannot leak via logs.
        formatter
            .debug_struct("CredentialRecord")
            .field("service", &self.service)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("source", &self.source)
            .finish()
    }
}
