// crates/atlas-gate-credentials/src/adc.rs
// ============================================================================
// Module: Application-Default Credential Discovery
// Description: Locates warehouse service-account/ADC key files.
// Purpose: Resolve warehouse authentication material before any network call.
// Dependencies: crate::{record, resolver}, std
// ============================================================================

//! ## Overview
//! The warehouse backend authenticates through a client library driven by a
//! key file: either an explicit path in an environment variable or the
//! well-known application-default-credentials file. Discovery only checks
//! that a file exists; reading and exchanging the key for a token is the
//! transport layer's concern. Absence of both locations is `NotConfigured`
//! with remediation text, never a panic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::path::PathBuf;

use crate::record::SourceTier;
use crate::resolver::CredentialError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable naming an explicit service-account key file.
const KEY_FILE_ENV_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Well-known ADC path relative to the home directory.
const ADC_RELATIVE_PATH: &str = ".config/gcloud/application_default_credentials.json";

// ============================================================================
// SECTION: Discovery Profile
// ============================================================================

/// Lookup locations for warehouse credential discovery.
///
/// Tests construct this directly; production code uses [`AdcProfile::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdcProfile {
    /// Key file path taken from the environment, if any.
    pub env_key_file: Option<PathBuf>,
    /// Well-known application-default-credentials path, if derivable.
    pub well_known_file: Option<PathBuf>,
}

impl AdcProfile {
    /// Builds the profile from the real process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            env_key_file: env::var_os(KEY_FILE_ENV_VAR).map(PathBuf::from),
            well_known_file: env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(ADC_RELATIVE_PATH)),
        }
    }
}

// ============================================================================
// SECTION: Resolved Credentials
// ============================================================================

/// Discovered warehouse credential location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdcCredentials {
    /// Path to the key file the client library should load.
    pub key_file: PathBuf,
    /// Tier that supplied the path.
    pub source: SourceTier,
}

/// Resolves warehouse credentials from the discovery profile.
///
/// The environment-provided path wins over the well-known file; a path that
/// does not exist on disk is a miss for its tier.
///
/// # Errors
///
/// Returns [`CredentialError::NotConfigured`] when neither location holds an
/// existing key file.
pub fn resolve_adc(profile: &AdcProfile) -> Result<AdcCredentials, CredentialError> {
    if let Some(path) = &profile.env_key_file
        && path.exists()
    {
        return Ok(AdcCredentials {
            key_file: path.clone(),
            source: SourceTier::Environment,
        });
    }
    if let Some(path) = &profile.well_known_file
        && path.exists()
    {
        return Ok(AdcCredentials {
            key_file: path.clone(),
            source: SourceTier::File,
        });
    }
    Err(CredentialError::NotConfigured {
        service: "warehouse".to_string(),
        hint: format!(
            "Point {KEY_FILE_ENV_VAR} at a service-account key file, or create the \
             application-default credentials file via your cloud SDK login."
        ),
    })
}
