use anyhow::{Context, Result};
use rusqlite::{Connection, types::Type};

use crate::{
    model::{CityAverage, Observation, Report, parse_timestamp},
    store::{validate_table_name, with_connection},
};

/// Run both read queries against the stored observations.
pub fn query(path: &std::path::Path, table: &str) -> Result<Report> {
    validate_table_name(table)?;

    with_connection(path, |conn| {
        Ok(Report { averages: averages(conn, table)?, latest: latest(conn, table)? })
    })
}

fn averages(conn: &Connection, table: &str) -> Result<Vec<CityAverage>> {
    let sql = format!(
        "SELECT city, ROUND(AVG(temperature), 2) AS avg_temp, COUNT(*) AS samples
         FROM {table}
         GROUP BY city
         ORDER BY avg_temp DESC"
    );

    let mut stmt = conn.prepare(&sql).context("Failed to prepare average temperature query")?;
    let rows = stmt.query_map([], |row| {
        Ok(CityAverage { city: row.get(0)?, avg_temp: row.get(1)?, samples: row.get(2)? })
    })?;

    rows.collect::<Result<Vec<_>, _>>().context("Failed to read average temperatures")
}

fn latest(conn: &Connection, table: &str) -> Result<Vec<Observation>> {
    let sql = format!(
        "SELECT w1.city, w1.temperature, w1.humidity, w1.weather, w1.wind_speed, w1.timestamp
         FROM {table} w1
         INNER JOIN (SELECT city, MAX(timestamp) AS maxt FROM {table} GROUP BY city) w2
         ON w1.city = w2.city AND w1.timestamp = w2.maxt
         ORDER BY w1.city"
    );

    let mut stmt = conn.prepare(&sql).context("Failed to prepare latest record query")?;
    let rows = stmt.query_map([], |row| {
        let ts: String = row.get(5)?;
        let timestamp = parse_timestamp(&ts)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

        Ok(Observation {
            city: row.get(0)?,
            temperature: row.get(1)?,
            humidity: row.get(2)?,
            weather: row.get(3)?,
            wind_speed: row.get(4)?,
            timestamp,
        })
    })?;

    rows.collect::<Result<Vec<_>, _>>().context("Failed to read latest records")
}
