//! # Discoteca Database Crate
//!
//! This crate is the application-specific interface to the PostgreSQL
//! database that stores the record shop: artists, records and sales.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All SQL lives here. The rest of the application sees typed
//!   values from `core-types` and a classified [`DbError`].
//! - **Engine does the work:** composite types, array containment and
//!   `unnest` are used directly in SQL instead of being emulated in Rust.
//! - **One connection, one transaction per write:** there is no pool; every
//!   write commits on success and rolls back on any failure.
//!
//! ## Public API
//!
//! - `connect` / `close`: open and close the single connection.
//! - `ensure_schema`: idempotently create the composite types and tables.
//! - `load_sample_data`: insert the sample catalog and one sale.
//! - `DbRepository`: sales, genre updates, artist deletion and the fixed reports.
//! - `install_reference_guard`: opt-in enforcement of artist references.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;
pub mod schema;
pub mod seed;
mod transaction;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{close, close_after, connect, connect_options};
pub use error::{DbError, FailureKind, classify_sqlstate};
pub use repository::{DbRepository, REPORT_CUSTOMER, REPORT_GENRE, REPORT_RECORD_ID};
pub use schema::{ensure_schema, ensure_schema_with_config, install_reference_guard, remove_reference_guard};
pub use seed::{SeedSummary, load_sample_data, load_sample_data_with_config};
pub use sqlx::postgres::PgConnection;
