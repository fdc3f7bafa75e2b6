// crates/atlas-gate-gateways/src/lib.rs
// ============================================================================
// Module: Atlas Gate Gateways
// Description: Portal and warehouse query gateways with shared error taxonomy.
// Purpose: Run validated, bounded, read-only SQL against two metadata backends.
// Dependencies: atlas-gate-core, atlas-gate-credentials, reqwest, serde_json
// ============================================================================

//! ## Overview
//! Two structurally parallel gateways share one path: safety validation, row
//! cap injection, credential resolution, transport, response parsing. The
//! portal gateway speaks the ClickHouse-style HTTP interface; the warehouse
//! gateway drives a BigQuery-style REST transport behind a trait. Validation
//! and credential failures are raised before any network attempt, and no
//! gateway ever retries on its own.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod builder;
pub mod error;
pub mod portal;
pub mod response;
pub mod warehouse;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use builder::FileFilters;
pub use builder::QueryBuilder;
pub use builder::escape_sql_string;
pub use builder::validate_table_name;
pub use error::GatewayError;
pub use error::TransportError;
pub use portal::ColumnSchema;
pub use portal::PortalConfig;
pub use portal::PortalGateway;
pub use portal::TableSchema;
pub use response::parse_json_rows;
pub use warehouse::DryRunEstimate;
pub use warehouse::RestTransportConfig;
pub use warehouse::RestWarehouseTransport;
pub use warehouse::WarehouseConfig;
pub use warehouse::WarehouseGateway;
pub use warehouse::WarehouseRequest;
pub use warehouse::WarehouseResponse;
pub use warehouse::WarehouseTransport;
