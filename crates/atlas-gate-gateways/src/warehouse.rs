// crates/atlas-gate-gateways/src/warehouse.rs
// ============================================================================
// Module: Warehouse Gateway
// Description: RPC gateway for the BigQuery-style warehouse backend.
// Purpose: Run validated, capped, read-only SQL and dry-run cost estimates.
// Dependencies: atlas-gate-core, atlas-gate-credentials, reqwest, serde
// ============================================================================

//! ## Overview
//! The warehouse backend is driven through the [`WarehouseTransport`] trait,
//! so gateway behavior is testable without a live service. The shipped
//! [`RestWarehouseTransport`] speaks the `jobs.query` REST shape: a JSON
//! request carrying the SQL and a dry-run flag, a JSON response carrying a
//! column schema, row cells, and a processed-byte count. The gateway applies
//! the same pre-network ordering as the portal: safety validation, row cap,
//! then application-default-credential discovery, and only then transport.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use atlas_gate_core::QueryResult;
use atlas_gate_core::Row;
use atlas_gate_core::SQL_ROW_CAP;
use atlas_gate_core::STRUCTURED_ROW_CAP;
use atlas_gate_core::check_safety;
use atlas_gate_core::ensure_row_limit;
use atlas_gate_core::has_limit_clause;
use atlas_gate_credentials::AdcProfile;
use atlas_gate_credentials::resolve_adc;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde::Serialize;
use serde_json::Value;

use crate::builder::QueryBuilder;
use crate::error::GatewayError;
use crate::error::TransportError;
use crate::error::classify_request_error;
use crate::response::clean_server_message;

// ============================================================================
// SECTION: Transport Boundary
// ============================================================================

/// One statement handed to a warehouse transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseRequest {
    /// Validated, capped SQL text.
    pub sql: String,
    /// When set, the backend validates and prices the statement without
    /// running it.
    pub dry_run: bool,
    /// Request deadline in milliseconds.
    pub timeout_ms: u64,
}

/// One transport answer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WarehouseResponse {
    /// Result rows; empty for dry runs.
    pub rows: Vec<Row>,
    /// Bytes the statement processed or would process.
    pub total_bytes_processed: Option<u64>,
}

/// Anything that can execute a warehouse request.
pub trait WarehouseTransport {
    /// Executes one request.
    ///
    /// # Errors
    ///
    /// Returns transport or parse failures; implementations never retry.
    fn execute(&self, request: &WarehouseRequest) -> Result<WarehouseResponse, GatewayError>;
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default request deadline in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Configuration for a [`WarehouseGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseConfig {
    /// Billing project the statements run under.
    pub project: String,
    /// Default dataset for structured queries.
    pub dataset: String,
    /// Versioned dataset consulted for table listings, when distinct.
    pub versioned_dataset: Option<String>,
    /// Request deadline in milliseconds.
    pub timeout_ms: u64,
    /// Row cap injected into ad-hoc SQL without a `LIMIT`.
    pub sql_row_cap: u64,
    /// Row cap injected into structured queries.
    pub structured_row_cap: u64,
    /// Where application default credentials are searched for.
    pub adc: AdcProfile,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            project: String::new(),
            dataset: String::new(),
            versioned_dataset: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            sql_row_cap: SQL_ROW_CAP,
            structured_row_cap: STRUCTURED_ROW_CAP,
            adc: AdcProfile::from_env(),
        }
    }
}

// ============================================================================
// SECTION: Dry Run Estimate
// ============================================================================

/// Cost estimate produced by a dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunEstimate {
    /// The exact SQL the estimate covers, after cap injection.
    pub sql: String,
    /// Bytes the statement would process.
    pub total_bytes_processed: u64,
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Gateway over a warehouse transport.
pub struct WarehouseGateway {
    /// Gateway configuration.
    config: WarehouseConfig,
    /// Transport executing the prepared requests.
    transport: Box<dyn WarehouseTransport + Send + Sync>,
}

impl WarehouseGateway {
    /// Creates a gateway from a config and transport.
    #[must_use]
    pub fn new(config: WarehouseConfig, transport: Box<dyn WarehouseTransport + Send + Sync>) -> Self {
        Self {
            config,
            transport,
        }
    }

    /// Runs an ad-hoc SQL statement.
    ///
    /// # Invariants
    ///
    /// Safety validation and credential discovery both complete before the
    /// transport is invoked.
    ///
    /// # Errors
    ///
    /// Returns the safety rejection, credential failure, or transport
    /// failure exactly as classified; nothing is retried.
    pub fn run_sql(&self, sql: &str) -> Result<QueryResult, GatewayError> {
        self.run_sql_with_limit(sql, None)
    }

    /// Runs an ad-hoc SQL statement with a caller-supplied row cap.
    ///
    /// `None` falls back to the configured ad-hoc cap. A statement that
    /// already carries its own `LIMIT` is left untouched either way.
    ///
    /// # Errors
    ///
    /// Same failure surface as [`Self::run_sql`].
    pub fn run_sql_with_limit(
        &self,
        sql: &str,
        limit: Option<u64>,
    ) -> Result<QueryResult, GatewayError> {
        self.run_capped(sql, limit.unwrap_or(self.config.sql_row_cap))
    }

    /// Runs a structured query rendered by a [`QueryBuilder`].
    ///
    /// # Errors
    ///
    /// Same failure surface as [`Self::run_sql`].
    pub fn run_structured(&self, query: &dyn QueryBuilder) -> Result<QueryResult, GatewayError> {
        self.run_capped(&query.build_sql(), self.config.structured_row_cap)
    }

    /// Prices a statement without running it.
    ///
    /// The estimate covers the statement exactly as it would later run,
    /// including the injected row cap.
    ///
    /// # Errors
    ///
    /// Same pre-network failures as [`Self::run_sql`], plus a parse failure
    /// when the backend omits the processed-byte count.
    pub fn dry_run(&self, sql: &str) -> Result<DryRunEstimate, GatewayError> {
        check_safety(sql)?;
        let statement = ensure_row_limit(sql, self.config.sql_row_cap);
        resolve_adc(&self.config.adc)?;

        let response = self.transport.execute(&WarehouseRequest {
            sql: statement.clone(),
            dry_run: true,
            timeout_ms: self.config.timeout_ms,
        })?;
        let total_bytes_processed = response.total_bytes_processed.ok_or_else(|| {
            GatewayError::Response("dry run response omitted totalBytesProcessed".to_string())
        })?;
        Ok(DryRunEstimate {
            sql: statement,
            total_bytes_processed,
        })
    }

    /// Lists tables of the versioned dataset, falling back to the default.
    ///
    /// # Errors
    ///
    /// Returns credential or transport failures from the listing query.
    pub fn list_tables(&self) -> Result<Vec<String>, GatewayError> {
        resolve_adc(&self.config.adc)?;
        let dataset = self.config.versioned_dataset.as_deref().unwrap_or(&self.config.dataset);
        let statement = format!(
            "SELECT table_name FROM `{}.{}.INFORMATION_SCHEMA.TABLES` ORDER BY table_name",
            self.config.project, dataset
        );
        let response = self.transport.execute(&WarehouseRequest {
            sql: statement,
            dry_run: false,
            timeout_ms: self.config.timeout_ms,
        })?;
        Ok(response
            .rows
            .iter()
            .filter_map(|row| row.get("table_name").and_then(Value::as_str))
            .map(ToString::to_string)
            .collect())
    }

    /// Shared ad-hoc and structured execution path.
    fn run_capped(&self, sql: &str, cap: u64) -> Result<QueryResult, GatewayError> {
        check_safety(sql)?;
        let cap_applied = !has_limit_clause(sql);
        let statement = ensure_row_limit(sql, cap);
        resolve_adc(&self.config.adc)?;

        let response = self.transport.execute(&WarehouseRequest {
            sql: statement,
            dry_run: false,
            timeout_ms: self.config.timeout_ms,
        })?;
        Ok(QueryResult::from_rows(response.rows, cap, cap_applied))
    }
}

// ============================================================================
// SECTION: REST Transport
// ============================================================================

/// Configuration for the REST transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestTransportConfig {
    /// Full `jobs.query` endpoint URL.
    pub endpoint: String,
    /// Bearer token minted from the discovered key file.
    pub access_token: String,
    /// Request deadline in milliseconds.
    pub timeout_ms: u64,
}

/// Wire shape of one `jobs.query` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequestBody<'a> {
    /// SQL text.
    query: &'a str,
    /// Standard SQL is always requested.
    use_legacy_sql: bool,
    /// Dry-run flag.
    dry_run: bool,
    /// Server-side wait deadline.
    timeout_ms: u64,
}

/// Blocking REST transport speaking the `jobs.query` shape.
pub struct RestWarehouseTransport {
    /// Transport configuration.
    config: RestTransportConfig,
    /// Shared HTTP client with the configured deadline.
    client: Client,
}

impl RestWarehouseTransport {
    /// Creates a transport from its config.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] when the HTTP client cannot be
    /// constructed.
    pub fn new(config: RestTransportConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .redirect(Policy::none())
            .build()
            .map_err(|err| TransportError::Connection(err.to_string()))?;
        Ok(Self {
            config,
            client,
        })
    }
}

impl WarehouseTransport for RestWarehouseTransport {
    fn execute(&self, request: &WarehouseRequest) -> Result<WarehouseResponse, GatewayError> {
        let body = QueryRequestBody {
            query: &request.sql,
            use_legacy_sql: false,
            dry_run: request.dry_run,
            timeout_ms: request.timeout_ms,
        };
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.access_token)
            .json(&body)
            .send()
            .map_err(|err| classify_request_error(&err, request.timeout_ms))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|err| classify_request_error(&err, request.timeout_ms))?;

        if status == 401 || status == 403 {
            return Err(TransportError::AuthRejected {
                status,
            }
            .into());
        }
        if !(200..300).contains(&status) {
            return Err(TransportError::Http {
                status,
                message: clean_server_message(&text),
                hints: Vec::new(),
            }
            .into());
        }

        let value: Value = serde_json::from_str(&text).map_err(|err| {
            GatewayError::Response(format!("warehouse response is not JSON: {err}"))
        })?;
        parse_query_response(&value)
    }
}

// ============================================================================
// SECTION: Response Parsing
// ============================================================================

/// Converts a `jobs.query` response body into the transport answer.
///
/// Row cells arrive positionally under `rows[].f[].v`; they are zipped with
/// `schema.fields[].name` into named row mappings.
///
/// # Errors
///
/// Returns [`GatewayError::Response`] when rows are present without a schema.
pub(crate) fn parse_query_response(value: &Value) -> Result<WarehouseResponse, GatewayError> {
    let total_bytes_processed = value
        .get("totalBytesProcessed")
        .and_then(|bytes| match bytes {
            Value::String(text) => text.parse::<u64>().ok(),
            Value::Number(number) => number.as_u64(),
            _ => None,
        });

    let field_names: Vec<String> = value
        .get("schema")
        .and_then(|schema| schema.get("fields"))
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .filter_map(|field| field.get("name").and_then(Value::as_str))
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default();

    let raw_rows = value.get("rows").and_then(Value::as_array);
    let mut rows = Vec::new();
    if let Some(raw_rows) = raw_rows {
        if field_names.is_empty() && !raw_rows.is_empty() {
            return Err(GatewayError::Response(
                "warehouse response carried rows without a schema".to_string(),
            ));
        }
        for raw_row in raw_rows {
            let cells = raw_row.get("f").and_then(Value::as_array);
            let mut row = Row::new();
            if let Some(cells) = cells {
                for (name, cell) in field_names.iter().zip(cells) {
                    let cell_value = cell.get("v").cloned().unwrap_or(Value::Null);
                    row.insert(name.clone(), cell_value);
                }
            }
            rows.push(row);
        }
    }

    Ok(WarehouseResponse {
        rows,
        total_bytes_processed,
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::panic,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use serde_json::json;

    use super::parse_query_response;

    #[test]
    fn parses_schema_and_positional_cells() {
        let value = json!({
            "schema": {"fields": [{"name": "atlas"}, {"name": "files"}]},
            "rows": [
                {"f": [{"v": "atlas_a"}, {"v": "12"}]},
                {"f": [{"v": "atlas_b"}, {"v": "7"}]}
            ],
            "totalBytesProcessed": "2048"
        });
        let response = parse_query_response(&value).unwrap();
        assert_eq!(response.rows.len(), 2);
        assert_eq!(response.rows[0].get("atlas").unwrap(), "atlas_a");
        assert_eq!(response.rows[1].get("files").unwrap(), "7");
        assert_eq!(response.total_bytes_processed, Some(2048));
    }

    #[test]
    fn dry_run_shape_has_no_rows() {
        let value = json!({"totalBytesProcessed": "9000"});
        let response = parse_query_response(&value).unwrap();
        assert!(response.rows.is_empty());
        assert_eq!(response.total_bytes_processed, Some(9000));
    }

    #[test]
    fn rows_without_schema_are_rejected() {
        let value = json!({"rows": [{"f": [{"v": "orphan"}]}]});
        assert!(parse_query_response(&value).is_err());
    }
}
