//! Prometheus metrics for lookups and imports.
//!
//! This module provides metrics for:
//! - Lookup outcomes by status class
//! - Join query latency and result size
//! - Imported rows and import duration

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use strum::IntoStaticStr;
use tracing::debug;

// === Metric Name Constants ===

/// Lookup requests counter metric name.
pub const METRIC_LOOKUP_REQUESTS: &str = "county_lookup_requests_total";
/// Lookup query latency metric name.
pub const METRIC_LOOKUP_QUERY_LATENCY: &str = "county_lookup_query_latency_ms";
/// Rows returned per successful lookup metric name.
pub const METRIC_LOOKUP_ROWS: &str = "county_lookup_rows_returned";
/// Imported rows counter metric name.
pub const METRIC_IMPORT_ROWS: &str = "import_rows_total";
/// Import duration metric name.
pub const METRIC_IMPORT_LATENCY: &str = "import_latency_ms";

/// Terminal outcome of one `POST /county_data` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum LookupOutcome {
    /// Rows found.
    Found,
    /// No rows for the zip/measure pair.
    NotFound,
    /// Client input rejected.
    Rejected,
    /// The coffee override fired.
    Teapot,
    /// Store or I/O failure.
    Failed,
}

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_counter!(
        METRIC_LOOKUP_REQUESTS,
        "Total number of county lookups by outcome"
    );
    describe_histogram!(
        METRIC_LOOKUP_QUERY_LATENCY,
        "Join query latency in milliseconds, including the read-only open"
    );
    describe_histogram!(
        METRIC_LOOKUP_ROWS,
        "Number of ranking rows returned by a successful lookup"
    );
    describe_counter!(METRIC_IMPORT_ROWS, "Total number of CSV rows imported");
    describe_histogram!(
        METRIC_IMPORT_LATENCY,
        "CSV import duration in milliseconds"
    );

    debug!("Metrics initialized");
}

/// Install the global Prometheus recorder and return its render handle.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Count one lookup by outcome.
pub fn inc_lookup(outcome: LookupOutcome) {
    let label: &'static str = outcome.into();
    counter!(METRIC_LOOKUP_REQUESTS, "outcome" => label).increment(1);
}

/// Record how many rows a lookup returned.
pub fn record_lookup_rows(rows: usize) {
    histogram!(METRIC_LOOKUP_ROWS).record(rows as f64);
}

/// Count rows written by an import.
pub fn inc_import_rows(table: &str, rows: u64) {
    counter!(METRIC_IMPORT_ROWS, "table" => table.to_string()).increment(rows);
}

/// Record import duration.
pub fn record_import_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_IMPORT_LATENCY).record(latency_ms);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name).record(latency_ms);
    }
}

/// Create a latency timer for the lookup query.
pub fn timer_lookup_query() -> LatencyTimer {
    LatencyTimer::new(METRIC_LOOKUP_QUERY_LATENCY)
}
