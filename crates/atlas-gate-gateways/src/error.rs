// crates/atlas-gate-gateways/src/error.rs
// ============================================================================
// Module: Gateway Error Taxonomy
// Description: Typed errors raised by the query gateways.
// Purpose: Keep rejection, credential, and transport failures distinguishable.
// Dependencies: atlas-gate-core, atlas-gate-credentials, thiserror
// ============================================================================

//! ## Overview
//! Every error carries a stable machine-readable kind string distinct from
//! its human message, so a CLI layer can map kinds to exit codes without
//! string-matching messages. Safety rejections and credential failures are
//! raised before any network attempt; transport failures carry the
//! underlying status and any server-derived hints. Messages never include
//! credential field values or raw response dumps beyond a bounded excerpt.

// ============================================================================
// SECTION: Imports
// ============================================================================

use atlas_gate_core::SafetyError;
use atlas_gate_credentials::CredentialError;
use thiserror::Error;

// ============================================================================
// SECTION: Transport Errors
// ============================================================================

/// Network-level failures surfaced by a gateway transport.
///
/// No retry is ever attempted; callers that want retries implement that
/// policy themselves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Backend returned a non-success HTTP status.
    #[error("backend returned HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Bounded server message excerpt.
        message: String,
        /// Remediation hints derived from the server message.
        hints: Vec<String>,
    },
    /// Backend rejected the resolved credentials.
    ///
    /// Distinct from credentials missing, which is caught before the call.
    #[error("backend rejected credentials (HTTP {status})")]
    AuthRejected {
        /// HTTP status code, typically 401 or 403.
        status: u16,
    },
    /// The request exceeded its deadline; no partial result exists.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// Deadline that was exceeded, in milliseconds.
        timeout_ms: u64,
    },
    /// The backend could not be reached.
    #[error("could not reach backend: {0}")]
    Connection(String),
}

impl TransportError {
    /// Returns the stable machine-readable kind for this error.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Http { .. } | Self::Connection(_) => "transport",
            Self::AuthRejected { .. } => "auth-rejected",
            Self::Timeout { .. } => "timeout",
        }
    }
}

// ============================================================================
// SECTION: Gateway Errors
// ============================================================================

/// Unified error surface for gateway calls.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The safety validator rejected the statement; nothing was sent.
    #[error("{0}. Only read-only queries are allowed")]
    Unsafe(#[from] SafetyError),
    /// Credential resolution failed before any network attempt.
    #[error(transparent)]
    Credential(#[from] CredentialError),
    /// The transport call failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The backend answered but its payload was not in the expected shape.
    #[error("backend response could not be parsed: {0}")]
    Response(String),
    /// An identifier supplied by the caller is not a bare table name.
    #[error("invalid table name '{0}': use only alphanumerics and underscores")]
    InvalidIdentifier(String),
}

impl GatewayError {
    /// Returns the stable machine-readable kind for this error.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unsafe(inner) => inner.kind(),
            Self::Credential(inner) => inner.kind(),
            Self::Transport(inner) => inner.kind(),
            Self::Response(_) => "malformed-response",
            Self::InvalidIdentifier(_) => "invalid-identifier",
        }
    }
}

// ============================================================================
// SECTION: Classification Helpers
// ============================================================================

/// Maps a reqwest failure onto the transport taxonomy.
pub(crate) fn classify_request_error(err: &reqwest::Error, timeout_ms: u64) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout {
            timeout_ms,
        };
    }
    let detail: String = err.to_string().chars().take(200).collect();
    TransportError::Connection(detail)
}
