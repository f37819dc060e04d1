//! HTTP API handlers.

use std::fmt;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{debug, info};

use super::error::{ApiError, Passthrough};
use crate::config::Config;
use crate::lookup::{evaluate, Verdict};
use crate::measures::AllowList;
use crate::metrics::{self, LookupOutcome};
use crate::store::{CountyStore, StoreProbe};

/// Message for a valid lookup that matched nothing.
pub const NO_DATA_MESSAGE: &str = "no data found for zip/measure_name";

/// Application state shared with handlers. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    /// Store the lookups read from.
    pub store: CountyStore,
    /// Accepted measure names.
    pub measures: Arc<AllowList>,
    /// Prometheus render handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(store: CountyStore, measures: AllowList) -> Self {
        Self {
            store,
            measures: Arc::new(measures),
            metrics: None,
        }
    }

    /// Build state from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(CountyStore::new(&config.db_path), config.allow_list())
    }

    /// Attach a Prometheus handle for `GET /metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .field("measures", &self.measures.len())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

/// Liveness probe: store file presence and size.
pub async fn healthz(State(state): State<AppState>) -> Json<StoreProbe> {
    Json(state.store.probe().await)
}

/// Prometheus text exposition.
pub async fn metrics_text(State(state): State<AppState>) -> Result<String, ApiError> {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .ok_or_else(|| ApiError::NotFound("metrics recorder is not installed".to_string()))
}

/// `POST /county_data`: validate the body, then look up the county series.
pub async fn county_data(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    let query = match evaluate(content_type, &body, &state.measures) {
        Verdict::Lookup(query) => query,
        Verdict::Teapot => {
            metrics::inc_lookup(LookupOutcome::Teapot);
            return Ok((StatusCode::IM_A_TEAPOT, Extension(Passthrough)).into_response());
        }
        Verdict::Reject(rejection) => {
            debug!(reason = %rejection, "Lookup rejected");
            metrics::inc_lookup(LookupOutcome::Rejected);
            return Err(rejection.into());
        }
    };

    let rows = state.store.lookup(&query).await.map_err(|err| {
        metrics::inc_lookup(LookupOutcome::Failed);
        ApiError::from(err)
    })?;

    if rows.is_empty() {
        info!(zip = %query.zip, measure = %query.measure_name, "No rows for lookup");
        metrics::inc_lookup(LookupOutcome::NotFound);
        return Err(ApiError::NotFound(NO_DATA_MESSAGE.to_string()));
    }

    metrics::inc_lookup(LookupOutcome::Found);
    metrics::record_lookup_rows(rows.len());
    Ok((StatusCode::OK, Json(rows)).into_response())
}
