// crates/atlas-gate-credentials/src/lib.rs
// ============================================================================
// Module: Atlas Gate Credentials
// Description: Tiered credential resolution for query backends.
// Purpose: Resolve named secrets through environment, secret store, and file.
// Dependencies: crate::{resolver, record, store, adc}
// ============================================================================

//! ## Overview
//! Credentials are resolved through three ordered tiers: a process
//! environment variable, an optional OS secret store, and a local JSON file.
//! The first complete record wins and reports which tier supplied it. A
//! missing credential is a typed `NotConfigured` result with a remediation
//! hint, never a panic; a present-but-unparsable source is the distinct
//! `Corrupt` error so users fix the right thing. Field values are never
//! logged and never appear in error messages.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod adc;
pub mod record;
pub mod resolver;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use adc::AdcCredentials;
pub use adc::AdcProfile;
pub use adc::resolve_adc;
pub use record::CredentialRecord;
pub use record::SourceTier;
pub use resolver::CredentialError;
pub use resolver::CredentialResolver;
pub use resolver::ServiceProfile;
pub use store::InMemorySecretStore;
pub use store::SecretStore;
