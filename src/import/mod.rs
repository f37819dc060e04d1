//! Offline CSV to SQLite importer.
//!
//! The table is named after the CSV file stem and gets one `TEXT` column per
//! header cell. Table and column identifiers are interpolated verbatim: the
//! caller vouches that they are valid SQL identifiers, nothing is quoted or
//! checked here.

pub mod dialect;
pub mod reader;

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Instant;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use sqlx::{ConnectOptions, Connection, Sqlite, Transaction};
use tracing::{debug, info, instrument};

use crate::error::ImportError;
use crate::metrics;

pub use dialect::{Dialect, SAMPLE_BYTES};
pub use reader::{Record, RecordReader};

/// Rows buffered between insert flushes.
pub const BATCH_SIZE: usize = 1000;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// What an import produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// Table that was (re)created.
    pub table: String,
    /// Column names, trimmed, in header order.
    pub columns: Vec<String>,
    /// Data rows inserted.
    pub rows: u64,
}

/// Table name for a CSV path: the file name without its extension.
pub fn table_name(csv_path: &Path) -> Result<String, ImportError> {
    csv_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ImportError::NoTableName(csv_path.to_path_buf()))
}

/// Pad with empty cells or truncate so the row has exactly `width` cells.
pub fn normalize_row(mut record: Record, width: usize) -> Vec<String> {
    record.resize(width, String::new());
    record
}

/// Trim header cells, rejecting an empty header or blank names.
pub fn header_columns(header: &[String]) -> Result<Vec<String>, ImportError> {
    let columns: Vec<String> = header.iter().map(|cell| cell.trim().to_string()).collect();
    if columns.is_empty() || columns.iter().any(String::is_empty) {
        return Err(ImportError::InvalidHeader);
    }
    Ok(columns)
}

/// Open a CSV file with its BOM skipped and its dialect sniffed.
fn open_csv(csv_path: &Path) -> Result<RecordReader<BufReader<File>>, ImportError> {
    let mut file = File::open(csv_path)?;

    let mut sample = Vec::with_capacity(SAMPLE_BYTES + UTF8_BOM.len());
    (&mut file)
        .take((SAMPLE_BYTES + UTF8_BOM.len()) as u64)
        .read_to_end(&mut sample)?;

    let offset = if sample.starts_with(UTF8_BOM) {
        UTF8_BOM.len()
    } else {
        0
    };
    let content = &sample[offset..];
    let truncated = content.len() > SAMPLE_BYTES;
    let content = &content[..content.len().min(SAMPLE_BYTES)];

    let dialect = Dialect::detect(content, truncated);
    debug!(
        delimiter = %char::from(dialect.delimiter).escape_default(),
        quote = %char::from(dialect.quote),
        skip_initial_space = dialect.skip_initial_space,
        "CSV dialect"
    );

    file.seek(SeekFrom::Start(offset as u64))?;

    Ok(RecordReader::new(BufReader::new(file), dialect))
}

/// Import `csv_path` into the SQLite store at `store_path`.
///
/// The header is validated before the store is opened, so an empty or
/// malformed header leaves the store untouched. Everything after that runs
/// in one transaction that is committed only when every row is written.
#[instrument(skip_all, fields(store = %store_path.display(), csv = %csv_path.display()))]
pub async fn import_csv(store_path: &Path, csv_path: &Path) -> Result<ImportSummary, ImportError> {
    let start = Instant::now();

    if !csv_path.exists() {
        return Err(ImportError::CsvNotFound(csv_path.to_path_buf()));
    }

    let table = table_name(csv_path)?;
    let mut records = open_csv(csv_path)?;

    let header = records.next().ok_or(ImportError::Empty)??;
    let columns = header_columns(&header)?;

    let mut conn = SqliteConnectOptions::new()
        .filename(store_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .connect()
        .await?;

    let mut tx = conn.begin().await?;
    recreate_table(&mut tx, &table, &columns).await?;

    let insert_sql = insert_statement(&table, columns.len());
    let mut batch: Vec<Vec<String>> = Vec::with_capacity(BATCH_SIZE);
    let mut rows = 0u64;

    for record in records {
        batch.push(normalize_row(record?, columns.len()));
        if batch.len() >= BATCH_SIZE {
            rows += flush(&mut tx, &insert_sql, &mut batch).await?;
        }
    }
    rows += flush(&mut tx, &insert_sql, &mut batch).await?;

    tx.commit().await?;
    conn.close().await?;

    metrics::inc_import_rows(&table, rows);
    metrics::record_import_latency(start);
    info!(table = %table, columns = columns.len(), rows, "CSV imported");

    Ok(ImportSummary {
        table,
        columns,
        rows,
    })
}

fn create_statement(table: &str, columns: &[String]) -> String {
    let definitions = columns
        .iter()
        .map(|column| format!("{column} TEXT"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {table} ({definitions})")
}

fn insert_statement(table: &str, width: usize) -> String {
    let placeholders = vec!["?"; width].join(", ");
    format!("INSERT INTO {table} VALUES ({placeholders})")
}

async fn recreate_table(
    tx: &mut Transaction<'_, Sqlite>,
    table: &str,
    columns: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
        .execute(&mut **tx)
        .await?;
    sqlx::query(&create_statement(table, columns))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn flush(
    tx: &mut Transaction<'_, Sqlite>,
    insert_sql: &str,
    batch: &mut Vec<Vec<String>>,
) -> Result<u64, sqlx::Error> {
    let written = batch.len() as u64;
    for row in batch.drain(..) {
        let mut query = sqlx::query(insert_sql);
        for cell in row {
            query = query.bind(cell);
        }
        query.execute(&mut **tx).await?;
    }
    if written > 0 {
        debug!(rows = written, "Flushed insert batch");
    }
    Ok(written)
}
