//! Read-only access to the SQLite store populated by the importer.
//!
//! Every lookup opens its own read-only connection and closes it before
//! returning; nothing is pooled or cached between requests.

pub mod rows;

use std::path::{Path, PathBuf};

use futures::TryStreamExt;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::lookup::CountyQuery;
use crate::metrics;

pub use rows::{row_to_json, RankingRow};

/// Join from ZIP to county rankings, oldest release first.
pub const LOOKUP_SQL: &str = "\
SELECT ch.*
FROM county_health_rankings AS ch
JOIN zip_county AS zc ON zc.county_code = ch.fipscode
WHERE zc.zip = ? AND ch.measure_name = ?
ORDER BY ch.data_release_year";

/// Store file status reported by `GET /healthz`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreProbe {
    /// Store path, canonicalized when the file exists.
    pub db_path: String,
    /// Whether the store file exists.
    pub exists: bool,
    /// File size in bytes, 0 when missing.
    pub size: u64,
}

/// Handle to the county store file.
#[derive(Debug, Clone)]
pub struct CountyStore {
    path: PathBuf,
}

impl CountyStore {
    /// Create a handle; the file is not touched until a lookup runs.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Configured store path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a read-only connection. Never creates the file.
    pub async fn open_read_only(&self) -> Result<SqliteConnection, StoreError> {
        let conn = SqliteConnectOptions::new()
            .filename(&self.path)
            .read_only(true)
            .create_if_missing(false)
            .connect()
            .await?;
        Ok(conn)
    }

    /// Fetch all ranking rows for the county containing `query.zip`.
    #[instrument(skip(self), fields(zip = %query.zip, measure = %query.measure_name))]
    pub async fn lookup(&self, query: &CountyQuery) -> Result<Vec<RankingRow>, StoreError> {
        let _timer = metrics::timer_lookup_query();
        let mut conn = self.open_read_only().await?;

        let mut found = Vec::new();
        {
            let mut stream = sqlx::query(LOOKUP_SQL)
                .bind(query.zip.as_str())
                .bind(query.measure_name.as_str())
                .fetch(&mut conn);

            while let Some(row) = stream.try_next().await? {
                found.push(row_to_json(&row)?);
            }
        }

        conn.close().await?;
        debug!(rows = found.len(), "Lookup query finished");
        Ok(found)
    }

    /// Report whether the store file exists and its size.
    pub async fn probe(&self) -> StoreProbe {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => {
                let resolved = tokio::fs::canonicalize(&self.path)
                    .await
                    .unwrap_or_else(|_| self.path.clone());
                StoreProbe {
                    db_path: resolved.display().to_string(),
                    exists: true,
                    size: meta.len(),
                }
            }
            Err(_) => StoreProbe {
                db_path: self.path.display().to_string(),
                exists: false,
                size: 0,
            },
        }
    }
}
