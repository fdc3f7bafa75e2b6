// crates/atlas-gate-gateways/src/response.rs
// ============================================================================
// Module: Portal Response Parsing
// Description: JSONEachRow parsing and server-message hint derivation.
// Purpose: Turn the portal's wire formats into the common result shape.
// Dependencies: atlas-gate-core, serde_json
// ============================================================================

//! ## Overview
//! The portal answers `JSONEachRow`: one JSON object per line. Blank lines
//! are skipped; a response whose lines are all non-JSON is surfaced as a
//! parse failure carrying a bounded excerpt. Server error messages are also
//! scanned for known ClickHouse phrasings to attach remediation hints.

// ============================================================================
// SECTION: Imports
// ============================================================================

use atlas_gate_core::Row;
use serde_json::Value;

use crate::error::GatewayError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum characters of raw response echoed back in a parse failure.
const EXCERPT_CHARS: usize = 500;

// ============================================================================
// SECTION: Row Parsing
// ============================================================================

/// Parses a `JSONEachRow` response body into row mappings.
///
/// Non-JSON lines mixed into an otherwise valid response are dropped; a
/// response consisting only of non-JSON lines is an error, since that is how
/// the portal reports failures that slipped past the HTTP status.
///
/// # Errors
///
/// Returns [`GatewayError::Response`] when no line parses as a JSON object.
pub fn parse_json_rows(body: &str) -> Result<Vec<Row>, GatewayError> {
    let mut rows = Vec::new();
    let mut rejected = 0usize;
    let mut first_rejected: Option<&str> = None;

    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(map)) => rows.push(map),
            _ => {
                rejected += 1;
                first_rejected.get_or_insert(line);
            }
        }
    }

    if rows.is_empty() && rejected > 0 {
        let excerpt: String =
            first_rejected.unwrap_or_default().chars().take(EXCERPT_CHARS).collect();
        return Err(GatewayError::Response(format!("backend returned non-JSON rows: {excerpt}")));
    }
    Ok(rows)
}

/// Parses a TabSeparated single-column response into trimmed lines.
#[must_use]
pub(crate) fn parse_tab_separated(body: &str) -> Vec<String> {
    body.lines().map(str::trim).filter(|line| !line.is_empty()).map(ToString::to_string).collect()
}

// ============================================================================
// SECTION: Server Message Handling
// ============================================================================

/// Extracts a bounded, cleaned error message from an HTTP error body.
///
/// JSON bodies carrying an `exception` field are unwrapped; everything else
/// is truncated to a safe excerpt.
#[must_use]
pub(crate) fn clean_server_message(body: &str) -> String {
    if body.trim_start().starts_with('{')
        && let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body)
        && let Some(Value::String(exception)) = map.get("exception")
    {
        return exception.chars().take(EXCERPT_CHARS).collect();
    }
    body.chars().take(EXCERPT_CHARS).collect()
}

/// Derives remediation hints from known backend error phrasings.
#[must_use]
pub(crate) fn derive_hints(message: &str) -> Vec<String> {
    let mut hints = Vec::new();
    if message.contains("Unrecognized token") && message.contains("!=") {
        hints.push("Use <> instead of != for not-equal comparisons".to_string());
    }
    if message.contains("UNKNOWN_IDENTIFIER") || message.contains("Missing columns") {
        hints.push("Describe the table to see available column names".to_string());
    }
    if message.contains("CANNOT_PARSE_TEXT") || message.contains("CANNOT_PARSE_INPUT") {
        hints.push(
            "Use toInt32OrNull() or toFloat64OrNull() for columns with non-numeric values"
                .to_string(),
        );
    }
    if message.contains("Array")
        && (message.contains("ILLEGAL_TYPE") || message.contains("argument of function"))
    {
        hints.push("Use arrayExists() or arrayJoin() for array-typed columns".to_string());
    }
    hints
}
