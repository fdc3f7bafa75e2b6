// crates/atlas-gate-gateways/src/builder.rs
// ============================================================================
// Module: Structured Query Builder Boundary
// Description: QueryBuilder trait plus the files-table filter builder.
// Purpose: Turn typed filter sets into SQL text for the structured path.
// Dependencies: atlas-gate-core, crate::error
// ============================================================================

//! ## Overview
//! Structured queries enter a gateway through the [`QueryBuilder`] boundary:
//! anything that can render itself to SQL text. The shipped [`FileFilters`]
//! builder covers the common case of filtering the files table by organ,
//! assay, atlas, level, format, filename, or explicit record identifiers.
//! Values are escaped for single-quoted literals; array-typed columns are
//! matched via `arrayExists` instead of a bare `ILIKE`. The rendered SQL
//! still flows through the safety validator and row cap like any other
//! statement.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::error::GatewayError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Columns of the files table that are array-typed.
const ARRAY_COLUMNS: [&str; 1] = ["organ"];

/// Columns selected for file searches, including both download coordinates.
const FILE_COLUMNS: [&str; 9] = [
    "file_id",
    "filename",
    "file_format",
    "assay",
    "level",
    "organ",
    "atlas",
    "open_ref",
    "restricted_ref",
];

// ============================================================================
// SECTION: Builder Boundary
// ============================================================================

/// Anything that renders a typed filter set into SQL text.
pub trait QueryBuilder {
    /// Renders the SQL statement for this query.
    fn build_sql(&self) -> String;
}

// ============================================================================
// SECTION: SQL Text Helpers
// ============================================================================

/// Escapes a value for inclusion inside a single-quoted SQL literal.
///
/// The returned string carries no surrounding quotes.
#[must_use]
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Validates that an identifier is a bare table name.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidIdentifier`] for anything outside
/// `[A-Za-z0-9_]+`.
pub fn validate_table_name(name: &str) -> Result<(), GatewayError> {
    let valid =
        !name.is_empty() && name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if valid {
        Ok(())
    } else {
        Err(GatewayError::InvalidIdentifier(name.to_string()))
    }
}

/// Builds one WHERE fragment for a column filter.
fn where_clause(column: &str, value: &str) -> String {
    let escaped = escape_sql_string(value);
    if ARRAY_COLUMNS.contains(&column) {
        format!("arrayExists(x -> x ILIKE '%{escaped}%', {column})")
    } else {
        format!("{column} ILIKE '%{escaped}%'")
    }
}

// ============================================================================
// SECTION: File Filters
// ============================================================================

/// Typed filters over the files table.
///
/// Unset fields contribute no WHERE fragment; `record_ids` adds an exact
/// `IN` match on the file identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFilters {
    /// Substring match on organ (array column).
    pub organ: Option<String>,
    /// Substring match on assay name.
    pub assay: Option<String>,
    /// Substring match on atlas name.
    pub atlas: Option<String>,
    /// Substring match on processing level.
    pub level: Option<String>,
    /// Substring match on file format.
    pub file_format: Option<String>,
    /// Substring match on filename.
    pub filename: Option<String>,
    /// Exact file identifiers to look up.
    pub record_ids: Vec<String>,
}

impl QueryBuilder for FileFilters {
    fn build_sql(&self) -> String {
        let mut clauses = Vec::new();
        let filters = [
            ("organ", self.organ.as_deref()),
            ("assay", self.assay.as_deref()),
            ("atlas", self.atlas.as_deref()),
            ("level", self.level.as_deref()),
            ("file_format", self.file_format.as_deref()),
            ("filename", self.filename.as_deref()),
        ];
        for (column, value) in filters {
            if let Some(value) = value {
                clauses.push(where_clause(column, value));
            }
        }
        if !self.record_ids.is_empty() {
            let escaped: Vec<String> = self
                .record_ids
                .iter()
                .map(|record_id| format!("'{}'", escape_sql_string(record_id)))
                .collect();
            clauses.push(format!("file_id IN ({})", escaped.join(", ")));
        }

        let mut sql = format!("SELECT {} FROM files", FILE_COLUMNS.join(", "));
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql
    }
}
