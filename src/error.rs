//! Unified error types for the lookup service and the importer.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the crate.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// CSV import error.
    #[error("import error: {0}")]
    Import(#[from] ImportError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading the county store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite rejected the connection or the query.
    #[error("{0}")]
    Sqlite(#[from] sqlx::Error),
}

/// Errors raised by the CSV importer.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The CSV file does not exist.
    #[error("CSV not found: {}", .0.display())]
    CsvNotFound(PathBuf),

    /// The CSV path has no usable file stem to name the table after.
    #[error("cannot derive a table name from {}", .0.display())]
    NoTableName(PathBuf),

    /// The file has no header row at all.
    #[error("CSV appears to be empty (no header row).")]
    Empty,

    /// The header row is empty or has blank column names.
    #[error("Invalid CSV header: empty column names.")]
    InvalidHeader,

    /// A cell is not valid UTF-8.
    #[error("CSV is not valid UTF-8 (line {line})")]
    NotUtf8 { line: u64 },

    /// Failure reading the CSV file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite failure; the import transaction is rolled back.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
