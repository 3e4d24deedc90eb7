//! Append-only SQLite storage for observations.
//!
//! Every call opens its own connection and closes it before returning, so no
//! connection outlives a single write or query.

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, params};
use std::{fs, path::Path};

use crate::model::Observation;

/// Run `f` against a fresh connection to `path`. The connection is closed on
/// every exit path; a close failure is only surfaced when `f` succeeded.
pub(crate) fn with_connection<T>(
    path: &Path,
    f: impl FnOnce(&mut Connection) -> Result<T>,
) -> Result<T> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("Failed to open database: {}", path.display()))?;

    let out = f(&mut conn);
    let closed = conn.close().map_err(|(_, err)| err);

    let value = out?;
    closed.with_context(|| format!("Failed to close database: {}", path.display()))?;
    Ok(value)
}

/// Table names are interpolated into SQL, so only plain identifiers are accepted.
pub(crate) fn validate_table_name(table: &str) -> Result<()> {
    let mut chars = table.chars();
    let valid_start = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("Invalid table name '{table}': expected letters, digits and underscores");
    }
    Ok(())
}

/// Append `rows` to `table`, creating the database file and table on first use.
///
/// Returns the number of rows written. Rows are never deduplicated; a table
/// created earlier with different columns fails with the SQLite error.
pub fn append(path: &Path, table: &str, rows: &[Observation]) -> Result<usize> {
    validate_table_name(table)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
    }

    with_connection(path, |conn| {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                city TEXT,
                temperature REAL,
                humidity INTEGER,
                weather TEXT,
                wind_speed REAL,
                timestamp TEXT
            );"
        ))
        .with_context(|| format!("Failed to create table '{table}'"))?;

        let tx = conn.transaction()?;
        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO {table} (city, temperature, humidity, weather, wind_speed, timestamp)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
                ))
                .with_context(|| format!("Failed to prepare insert into '{table}'"))?;

            for row in rows {
                stmt.execute(params![
                    row.city,
                    row.temperature,
                    row.humidity,
                    row.weather,
                    row.wind_speed,
                    row.timestamp_text(),
                ])
                .with_context(|| format!("Failed to insert observation for {}", row.city))?;
            }
        }
        tx.commit().context("Failed to commit observations")?;

        Ok(rows.len())
    })
}

/// Total number of stored rows.
pub fn count(path: &Path, table: &str) -> Result<u64> {
    validate_table_name(table)?;

    with_connection(path, |conn| {
        let n: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .with_context(|| format!("Failed to count rows in '{table}'"))?;
        Ok(n as u64)
    })
}
