// crates/atlas-gate-gateways/src/portal.rs
// ============================================================================
// Module: Portal Gateway
// Description: HTTP gateway for the ClickHouse-style portal backend.
// Purpose: Run validated, capped, read-only SQL over the portal HTTP interface.
// Dependencies: atlas-gate-core, atlas-gate-credentials, reqwest, url
// ============================================================================

//! ## Overview
//! The portal backend speaks the ClickHouse HTTP interface: SQL is POSTed as
//! the request body with basic auth, and results come back as `JSONEachRow`.
//! Every ad-hoc statement passes the safety validator and receives a row cap
//! before credentials are even resolved; nothing touches the network until
//! both succeed. The target database can be pinned in the config or
//! discovered once per gateway by probing for the newest database matching a
//! configured prefix.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::OnceLock;
use std::time::Duration;

use atlas_gate_core::QueryResult;
use atlas_gate_core::SQL_ROW_CAP;
use atlas_gate_core::STRUCTURED_ROW_CAP;
use atlas_gate_core::check_safety;
use atlas_gate_core::ensure_row_limit;
use atlas_gate_core::has_limit_clause;
use atlas_gate_credentials::CredentialRecord;
use atlas_gate_credentials::CredentialResolver;
use atlas_gate_credentials::ServiceProfile;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use url::Url;

use crate::builder::QueryBuilder;
use crate::builder::validate_table_name;
use crate::error::GatewayError;
use crate::error::TransportError;
use crate::error::classify_request_error;
use crate::response::clean_server_message;
use crate::response::derive_hints;
use crate::response::parse_json_rows;
use crate::response::parse_tab_separated;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default request deadline in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Configuration for a [`PortalGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    /// Credential service name resolved before each call.
    pub service: String,
    /// Target database, or `None`/`"auto"` to discover one by prefix.
    pub database: Option<String>,
    /// Prefix used when discovering the newest available database.
    pub database_prefix: String,
    /// Request deadline in milliseconds.
    pub timeout_ms: u64,
    /// Row cap injected into ad-hoc SQL without a `LIMIT`.
    pub sql_row_cap: u64,
    /// Row cap injected into structured queries.
    pub structured_row_cap: u64,
    /// Allow plain HTTP instead of HTTPS. Intended for local fixtures.
    pub allow_http: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            service: "portal".to_string(),
            database: None,
            database_prefix: "atlas".to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            sql_row_cap: SQL_ROW_CAP,
            structured_row_cap: STRUCTURED_ROW_CAP,
            allow_http: false,
        }
    }
}

// ============================================================================
// SECTION: Table Schema
// ============================================================================

/// One column of a described table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    /// Column name.
    pub name: String,
    /// Backend type expression for the column.
    pub column_type: String,
}

/// Schema of one portal table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Table name as supplied by the caller.
    pub table: String,
    /// Columns in backend order.
    pub columns: Vec<ColumnSchema>,
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Blocking gateway over the portal HTTP interface.
pub struct PortalGateway {
    /// Gateway configuration.
    config: PortalConfig,
    /// Tiered credential resolver consulted before every call.
    resolver: CredentialResolver,
    /// Shared HTTP client with the configured deadline.
    client: Client,
    /// Database name discovered by prefix probe, cached per gateway.
    discovered: OnceLock<Option<String>>,
}

impl PortalGateway {
    /// Creates a gateway from a config and credential resolver.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] when the HTTP client cannot be
    /// constructed.
    pub fn new(config: PortalConfig, resolver: CredentialResolver) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .redirect(Policy::none())
            .build()
            .map_err(|err| TransportError::Connection(err.to_string()))?;
        Ok(Self {
            config,
            resolver,
            client,
            discovered: OnceLock::new(),
        })
    }

    /// Runs an ad-hoc SQL statement through the full safety pipeline.
    ///
    /// # Invariants
    ///
    /// Safety validation and credential resolution both complete before any
    /// network traffic.
    ///
    /// # Errors
    ///
    /// Returns the safety rejection, credential failure, transport failure,
    /// or parse failure exactly as classified; nothing is retried.
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
    /// Structured queries receive the tighter structured row cap.
    ///
    /// # Errors
    ///
    /// Same failure surface as [`Self::run_sql`].
    pub fn run_structured(&self, query: &dyn QueryBuilder) -> Result<QueryResult, GatewayError> {
        self.run_capped(&query.build_sql(), self.config.structured_row_cap)
    }

    /// Shared ad-hoc and structured execution path.
    fn run_capped(&self, sql: &str, cap: u64) -> Result<QueryResult, GatewayError> {
        check_safety(sql)?;
        let cap_applied = !has_limit_clause(sql);
        let statement = normalize_dialect(&ensure_row_limit(sql, cap));

        let creds = self.resolver.resolve(&self.profile())?;
        let database = self.database_for(&creds);
        let body = self.execute_raw(&creds, &statement, "JSONEachRow", database.as_deref())?;
        let rows = parse_json_rows(&body)?;
        Ok(QueryResult::from_rows(rows, cap, cap_applied))
    }

    /// Lists the tables of the active database.
    ///
    /// # Errors
    ///
    /// Returns credential, transport, or parse failures from the probe.
    pub fn list_tables(&self) -> Result<Vec<String>, GatewayError> {
        let creds = self.resolver.resolve(&self.profile())?;
        let database = self.database_for(&creds);
        let body = self.execute_raw(&creds, "SHOW TABLES", "TabSeparated", database.as_deref())?;
        Ok(parse_tab_separated(&body))
    }

    /// Describes one table of the active database.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidIdentifier`] before any network call
    /// when the table name is not a bare identifier, plus the usual
    /// credential, transport, and parse failures.
    pub fn describe_table(&self, table: &str) -> Result<TableSchema, GatewayError> {
        validate_table_name(table)?;
        let creds = self.resolver.resolve(&self.profile())?;
        let database = self.database_for(&creds);
        let statement = format!("DESCRIBE TABLE {table}");
        let body = self.execute_raw(&creds, &statement, "JSONEachRow", database.as_deref())?;

        let mut columns = Vec::new();
        for row in parse_json_rows(&body)? {
            let name = row.get("name").and_then(|value| value.as_str()).ok_or_else(|| {
                GatewayError::Response("describe row is missing a column name".to_string())
            })?;
            let column_type =
                row.get("type").and_then(|value| value.as_str()).unwrap_or_default();
            columns.push(ColumnSchema {
                name: name.to_string(),
                column_type: column_type.to_string(),
            });
        }
        Ok(TableSchema {
            table: table.to_string(),
            columns,
        })
    }

    /// Credential profile for this gateway's service.
    fn profile(&self) -> ServiceProfile {
        ServiceProfile::portal_for(&self.config.service)
    }

    /// Resolves the effective database for a call.
    ///
    /// A pinned config value wins; `None` or `"auto"` triggers a one-time
    /// prefix probe whose failure falls back to the configured value.
    fn database_for(&self, creds: &CredentialRecord) -> Option<String> {
        if let Some(database) = &self.config.database
            && database != "auto"
        {
            return Some(database.clone());
        }
        self.discovered
            .get_or_init(|| self.probe_database(creds).unwrap_or(None))
            .clone()
            .or_else(|| self.config.database.clone())
    }

    /// Probes for the newest database matching the configured prefix.
    fn probe_database(&self, creds: &CredentialRecord) -> Result<Option<String>, GatewayError> {
        let statement = format!(
            "SHOW DATABASES LIKE '{}%'",
            crate::builder::escape_sql_string(&self.config.database_prefix)
        );
        let body = self.execute_raw(creds, &statement, "TabSeparated", None)?;
        Ok(parse_tab_separated(&body).into_iter().max())
    }

    /// Sends one statement and returns the raw response body.
    fn execute_raw(
        &self,
        creds: &CredentialRecord,
        statement: &str,
        format: &str,
        database: Option<&str>,
    ) -> Result<String, GatewayError> {
        let endpoint = self.endpoint(creds, format, database)?;
        let user = creds.field("user").unwrap_or_default().to_string();
        let password = creds.field("password").unwrap_or_default().to_string();

        let response = self
            .client
            .post(endpoint)
            .basic_auth(user, Some(password))
            .body(statement.to_string())
            .send()
            .map_err(|err| classify_request_error(&err, self.config.timeout_ms))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| classify_request_error(&err, self.config.timeout_ms))?;

        if status == 401 || status == 403 {
            return Err(TransportError::AuthRejected {
                status,
            }
            .into());
        }
        if !(200..300).contains(&status) {
            let message = clean_server_message(&body);
            let hints = derive_hints(&message);
            return Err(TransportError::Http {
                status,
                message,
                hints,
            }
            .into());
        }
        Ok(body)
    }

    /// Builds the request URL from the resolved credentials.
    fn endpoint(
        &self,
        creds: &CredentialRecord,
        format: &str,
        database: Option<&str>,
    ) -> Result<Url, GatewayError> {
        let host = creds.field("host").unwrap_or_default();
        let port = creds.field("port").unwrap_or_default();
        let scheme = if self.config.allow_http { "http" } else { "https" };
        let mut url = Url::parse(&format!("{scheme}://{host}:{port}/"))
            .map_err(|err| TransportError::Connection(format!("invalid endpoint: {err}")))?;
        url.query_pairs_mut().append_pair("default_format", format);
        if let Some(database) = database {
            url.query_pairs_mut().append_pair("database", database);
        }
        Ok(url)
    }
}

// ============================================================================
// SECTION: Dialect Normalization
// ============================================================================

/// Rewrites common non-ClickHouse spellings into the portal dialect.
///
/// Shell-escaped `\!=` and plain `!=` both become `<>`.
#[must_use]
fn normalize_dialect(sql: &str) -> String {
    sql.replace("\\!=", "!=").replace("!=", "<>")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
