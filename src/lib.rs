//! County health-ranking lookup by ZIP code.
//!
//! Two halves share this crate:
//!
//! - an offline importer that loads CSV files into a SQLite store, one
//!   text-only table per file, and
//! - a stateless HTTP service that maps a ZIP code to its county (FIPS code)
//!   and returns that county's ranking series for one public-health measure.
//!
//! ```text
//! POST /county_data {"zip": "02138", "measure_name": "Adult obesity"}
//!   zip_county.zip = '02138'  ->  county_code '25017'
//!   county_health_rankings.fipscode = '25017' AND measure_name = 'Adult obesity'
//!   ORDER BY data_release_year
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`measures`]: Accepted measure catalogue
//! - [`lookup`]: Ordered request validation
//! - [`store`]: Read-only SQLite access
//! - [`import`]: CSV to SQLite importer
//! - [`api`]: HTTP API
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod import;
pub mod lookup;
pub mod measures;
pub mod metrics;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
