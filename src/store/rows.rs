//! Conversion of dynamically-shaped SQLite rows into JSON objects.

use serde_json::{Map, Number, Value};
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{Column, Decode, Row, TypeInfo, ValueRef};

/// One ranking row keyed by stored column name.
pub type RankingRow = Map<String, Value>;

/// Convert a row of any shape into a JSON object, keeping each value's
/// storage class.
pub fn row_to_json(row: &SqliteRow) -> Result<RankingRow, sqlx::Error> {
    let mut object = Map::new();

    for column in row.columns() {
        let raw = row.try_get_raw(column.ordinal())?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let storage = raw.type_info().into_owned();
            match storage.name() {
                "INTEGER" | "BIGINT" | "INT8" => Value::from(decode::<i64>(raw)?),
                "REAL" | "DOUBLE" | "FLOAT" => Number::from_f64(decode::<f64>(raw)?)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                "BLOB" => {
                    let bytes = decode::<Vec<u8>>(raw)?;
                    Value::String(String::from_utf8_lossy(&bytes).into_owned())
                }
                _ => Value::String(decode::<String>(raw)?),
            }
        };
        object.insert(column.name().to_string(), value);
    }

    Ok(object)
}

fn decode<'r, T>(raw: <Sqlite as sqlx::Database>::ValueRef<'r>) -> Result<T, sqlx::Error>
where
    T: Decode<'r, Sqlite>,
{
    T::decode(raw).map_err(sqlx::Error::Decode)
}
