// crates/atlas-gate-credentials/src/resolver.rs
// ============================================================================
// Module: Tiered Credential Resolver
// Description: Environment > secret store > file resolution for named secrets.
// Purpose: Resolve service credentials deterministically without echoing them.
// Dependencies: crate::{record, store}, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Resolution walks three tiers in strict priority order and returns the
//! first complete record. A tier that is absent is a miss; a tier that is
//! present but unparsable is a hard [`CredentialError::Corrupt`]; a tier
//! whose record parses but lacks a required field is a miss (no partial
//! record is ever used for security-sensitive fields). Resolution reads the
//! environment, the optional secret store, and at most one file; it performs
//! no writes and no network calls.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde_json::Value;

use crate::record::CredentialRecord;
use crate::record::SourceTier;
use crate::store::SecretStore;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum credential payload size accepted from any tier, in bytes.
const MAX_PAYLOAD_BYTES: usize = 64 * 1024;

/// Directory under the user config dir holding credential files.
const CONFIG_DIR_NAME: &str = "atlas-gate";

/// Fields a portal-style backend record must carry to be complete.
const PORTAL_REQUIRED_FIELDS: [&str; 4] = ["host", "port", "user", "password"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Credential resolution errors.
///
/// # Invariants
/// - `NotConfigured` is recoverable by user action and carries a non-empty
///   remediation hint.
/// - `Corrupt` names the offending source but never its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// No tier supplied a complete credential record.
    NotConfigured {
        /// Service the resolution was attempted for.
        service: String,
        /// Human-readable remediation text.
        hint: String,
    },
    /// A tier was present but its payload could not be parsed.
    Corrupt {
        /// Description of the offending source (variable name or file path).
        source: String,
    },
}

// Manual Display/Error impls: the `source` field is a textual description,
// not an underlying error, so a thiserror derive cannot be used (it would
// force the field into `Error::source`).
impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured { service, hint } => {
                write!(f, "credentials not configured for service '{service}'. {hint}")
            }
            Self::Corrupt { source } => {
                write!(f, "credential source is corrupt: {source}")
            }
        }
    }
}

impl std::error::Error for CredentialError {}

impl CredentialError {
    /// Returns the stable machine-readable kind for this error.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotConfigured { .. } => "not-configured",
            Self::Corrupt { .. } => "config-corrupt",
        }
    }
}

// ============================================================================
// SECTION: Service Profile
// ============================================================================

/// Static description of one service's credential shape and lookup names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceProfile {
    /// Service name, e.g. `portal`.
    pub service: String,
    /// Environment variable holding a JSON credential blob.
    pub env_var: String,
    /// Fields a record must carry to be considered complete.
    pub required_fields: Vec<String>,
}

impl ServiceProfile {
    /// Creates a profile with the conventional `<SERVICE>_CREDENTIALS` variable.
    #[must_use]
    pub fn new(service: impl Into<String>, required_fields: &[&str]) -> Self {
        let service = service.into();
        let env_var = format!("{}_CREDENTIALS", service.to_ascii_uppercase().replace('-', "_"));
        Self {
            service,
            env_var,
            required_fields: required_fields.iter().map(ToString::to_string).collect(),
        }
    }

    /// Profile for the portal ClickHouse-style backend.
    #[must_use]
    pub fn portal() -> Self {
        Self::portal_for("portal")
    }

    /// Portal-shaped profile under a custom service name.
    ///
    /// Carries the same required-field list as [`ServiceProfile::portal`],
    /// so gateways with a renamed service cannot drift from it.
    #[must_use]
    pub fn portal_for(service: impl Into<String>) -> Self {
        Self::new(service, &PORTAL_REQUIRED_FIELDS)
    }

    /// File name for this service under the resolver's config directory.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.json", self.service)
    }
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Tiered credential resolver passed into each gateway's constructor.
///
/// # Invariants
/// - Tiers are consulted in fixed priority order: environment, secret store,
///   file.
/// - The resolver holds no mutable state; each call is self-contained.
pub struct CredentialResolver {
    /// Override map consulted instead of the process environment when set.
    env_overrides: Option<BTreeMap<String, String>>,
    /// Optional secret store collaborator; absence is a miss, not an error.
    secret_store: Option<Box<dyn SecretStore + Send + Sync>>,
    /// Directory holding per-service credential files.
    config_dir: Option<PathBuf>,
}

impl CredentialResolver {
    /// Creates a resolver over the real process environment and the default
    /// per-user config directory, with no secret store attached.
    #[must_use]
    pub fn new() -> Self {
        Self {
            env_overrides: None,
            secret_store: None,
            config_dir: default_config_dir(),
        }
    }

    /// Attaches a secret store collaborator for the middle tier.
    #[must_use]
    pub fn with_secret_store(mut self, store: impl SecretStore + Send + Sync + 'static) -> Self {
        self.secret_store = Some(Box::new(store));
        self
    }

    /// Replaces environment reads with a deterministic override map.
    #[must_use]
    pub fn with_env_overrides(mut self, overrides: BTreeMap<String, String>) -> Self {
        self.env_overrides = Some(overrides);
        self
    }

    /// Overrides the directory searched for credential files.
    #[must_use]
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    /// Resolves credentials for a service through the three tiers.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::NotConfigured`] when no tier supplies a
    /// complete record, and [`CredentialError::Corrupt`] when a tier is
    /// present but unparsable.
    pub fn resolve(&self, profile: &ServiceProfile) -> Result<CredentialRecord, CredentialError> {
        if let Some(fields) = self.resolve_env(profile)? {
            return Ok(record(profile, fields, SourceTier::Environment));
        }
        if let Some(fields) = self.resolve_store(profile)? {
            return Ok(record(profile, fields, SourceTier::Keychain));
        }
        if let Some(fields) = self.resolve_file(profile)? {
            return Ok(record(profile, fields, SourceTier::File));
        }
        Err(CredentialError::NotConfigured {
            service: profile.service.clone(),
            hint: remediation_hint(profile, self.config_dir.as_deref()),
        })
    }

    /// Reports which tier would satisfy a resolution, if any.
    #[must_use]
    pub fn detect_source(&self, profile: &ServiceProfile) -> Option<SourceTier> {
        self.resolve(profile).ok().map(|resolved| resolved.source)
    }

    /// Environment tier: `<SERVICE>_CREDENTIALS` holding a JSON blob.
    fn resolve_env(
        &self,
        profile: &ServiceProfile,
    ) -> Result<Option<BTreeMap<String, String>>, CredentialError> {
        let raw = match &self.env_overrides {
            Some(overrides) => overrides.get(&profile.env_var).cloned(),
            None => env::var(&profile.env_var).ok(),
        };
        let Some(raw) = raw else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        let fields = parse_payload(&raw, &format!("environment variable {}", profile.env_var))?;
        Ok(complete_only(fields, profile))
    }

    /// Secret store tier: best-effort lookup by service name.
    fn resolve_store(
        &self,
        profile: &ServiceProfile,
    ) -> Result<Option<BTreeMap<String, String>>, CredentialError> {
        let Some(store) = &self.secret_store else {
            return Ok(None);
        };
        let Some(raw) = store.lookup(&profile.service) else {
            return Ok(None);
        };
        let fields =
            parse_payload(&raw, &format!("secret store entry for '{}'", profile.service))?;
        Ok(complete_only(fields, profile))
    }

    /// File tier: JSON file at a fixed per-service path.
    fn resolve_file(
        &self,
        profile: &ServiceProfile,
    ) -> Result<Option<BTreeMap<String, String>>, CredentialError> {
        let Some(dir) = &self.config_dir else {
            return Ok(None);
        };
        let path = dir.join(profile.file_name());
        if !path.exists() {
            return Ok(None);
        }
        let source = path.display().to_string();
        let bytes = fs::read(&path).map_err(|_| CredentialError::Corrupt {
            source: source.clone(),
        })?;
        if bytes.len() > MAX_PAYLOAD_BYTES {
            return Err(CredentialError::Corrupt {
                source,
            });
        }
        let raw = std::str::from_utf8(&bytes).map_err(|_| CredentialError::Corrupt {
            source: source.clone(),
        })?;
        let fields = parse_payload(raw, &source)?;
        Ok(complete_only(fields, profile))
    }
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the immutable record returned to a gateway.
fn record(
    profile: &ServiceProfile,
    fields: BTreeMap<String, String>,
    source: SourceTier,
) -> CredentialRecord {
    CredentialRecord {
        service: profile.service.clone(),
        fields,
        source,
    }
}

/// Parses a JSON object payload into string fields.
///
/// Scalar values are coerced to strings so that `"port": 8443` and
/// `"port": "8443"` are equivalent. Anything that is not a JSON object of
/// scalars is corrupt.
fn parse_payload(
    raw: &str,
    source: &str,
) -> Result<BTreeMap<String, String>, CredentialError> {
    if raw.len() > MAX_PAYLOAD_BYTES {
        return Err(CredentialError::Corrupt {
            source: source.to_string(),
        });
    }
    let value: Value = serde_json::from_str(raw).map_err(|_| CredentialError::Corrupt {
        source: source.to_string(),
    })?;
    let Value::Object(map) = value else {
        return Err(CredentialError::Corrupt {
            source: source.to_string(),
        });
    };
    let mut fields = BTreeMap::new();
    for (key, value) in map {
        let rendered = match value {
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => {
                return Err(CredentialError::Corrupt {
                    source: source.to_string(),
                });
            }
        };
        fields.insert(key, rendered);
    }
    Ok(fields)
}

/// Keeps a parsed record only when all required fields are present and
/// non-empty; a partial record is a miss for its tier.
fn complete_only(
    fields: BTreeMap<String, String>,
    profile: &ServiceProfile,
) -> Option<BTreeMap<String, String>> {
    let complete = profile
        .required_fields
        .iter()
        .all(|name| fields.get(name).is_some_and(|value| !value.is_empty()));
    complete.then_some(fields)
}

/// Remediation text attached to `NotConfigured`; names lookup locations but
/// never their contents.
fn remediation_hint(profile: &ServiceProfile, config_dir: Option<&Path>) -> String {
    let file_hint = config_dir.map_or_else(
        || format!("a {} file in the atlas-gate config directory", profile.file_name()),
        |dir| dir.join(profile.file_name()).display().to_string(),
    );
    format!(
        "Set the {} environment variable (JSON object), store an entry for '{}' in the OS secret \
         store, or create {}.",
        profile.env_var, profile.service, file_hint
    )
}

/// Default per-user config directory, when a home directory is known.
fn default_config_dir() -> Option<PathBuf> {
    env::var_os("HOME").map(|home| PathBuf::from(home).join(".config").join(CONFIG_DIR_NAME))
}
