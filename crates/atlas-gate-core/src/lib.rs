// crates/atlas-gate-core/src/lib.rs
// ============================================================================
// Module: Atlas Gate Core Library
// Description: Public API surface for the Atlas Gate core.
// Purpose: Expose the SQL safety validator, tier inference, and result model.
// Dependencies: crate::{sql, tier, result}
// ============================================================================

//! ## Overview
//! Atlas Gate core provides the backend-agnostic pieces shared by both query
//! gateways: the SQL safety validator with its row-cap helper, the access-tier
//! inference engine, and the common query result shape. Everything here is a
//! pure function over its inputs; no module performs I/O.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod result;
pub mod sql;
pub mod tier;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use result::QueryResult;
pub use result::Row;
pub use sql::BLOCKED_KEYWORDS;
pub use sql::SQL_ROW_CAP;
pub use sql::STRUCTURED_ROW_CAP;
pub use sql::SafetyError;
pub use sql::check_safety;
pub use sql::ensure_row_limit;
pub use sql::has_limit_clause;
pub use tier::AccessTier;
pub use tier::ProcessingLevel;
pub use tier::RecordDescriptor;
pub use tier::TierRule;
pub use tier::UnknownLevelError;
pub use tier::infer_tier;
pub use tier::tier_rules;
