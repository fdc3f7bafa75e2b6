// crates/atlas-gate-core/src/result.rs
// ============================================================================
// Module: Query Result Model
// Description: Common tabular result shape produced by both gateways.
// Purpose: Carry bounded row mappings plus truncation metadata to formatters.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Both gateways parse their backend's wire format into this one shape: an
//! ordered sequence of row mappings plus a row count and a truncation flag.
//! The row count never exceeds the cap the gateway applied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Result Types
// ============================================================================

/// One result row: column name to scalar, array, or null value.
pub type Row = serde_json::Map<String, Value>;

/// Bounded tabular result of a single gateway call.
///
/// # Invariants
/// - `row_count == rows.len()`.
/// - `row_count` never exceeds the cap the gateway applied.
/// - `truncated` is true only when the gateway injected the cap and the
///   backend filled it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Ordered result rows.
    pub rows: Vec<Row>,
    /// Number of rows returned.
    pub row_count: usize,
    /// True when the row cap was applied and reached.
    pub truncated: bool,
}

impl QueryResult {
    /// Builds a result from parsed rows.
    ///
    /// `cap_applied` indicates whether the gateway injected a row cap into
    /// the statement; the result is marked truncated when that cap was hit.
    #[must_use]
    pub fn from_rows(rows: Vec<Row>, cap: u64, cap_applied: bool) -> Self {
        let row_count = rows.len();
        let truncated = cap_applied && u64::try_from(row_count).unwrap_or(u64::MAX) >= cap;
        Self {
            rows,
            row_count,
            truncated,
        }
    }

    /// Returns true when the result holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
