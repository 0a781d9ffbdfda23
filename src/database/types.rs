//! Column extraction from tiberius rows.

use crate::error::ServerError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use tiberius::Row;

/// Display format for timestamps in API responses.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A timestamp column value, with or without an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlTimestamp {
    /// `datetime` / `datetime2` / `smalldatetime`
    Naive(NaiveDateTime),
    /// `datetimeoffset`
    WithOffset(DateTime<FixedOffset>),
}

impl SqlTimestamp {
    /// A `date` column, read as midnight of that day.
    pub fn from_date(date: NaiveDate) -> Self {
        SqlTimestamp::Naive(date.and_time(NaiveTime::MIN))
    }

    /// Format as `YYYY-MM-DD HH:MM:SS`.
    ///
    /// The wall-clock time stored in the column is used as-is; any offset is
    /// dropped rather than converted and fractional seconds are truncated.
    pub fn format(&self) -> String {
        let wall_clock = match self {
            SqlTimestamp::Naive(v) => *v,
            SqlTimestamp::WithOffset(v) => v.naive_local(),
        };
        wall_clock.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Column extraction helpers.
pub struct TypeMapper;

impl TypeMapper {
    /// Read a nullable text column.
    pub fn get_text(row: &Row, idx: usize) -> Result<Option<String>, ServerError> {
        row.try_get::<&str, _>(idx)
            .map(|v| v.map(str::to_string))
            .map_err(|e| column_error(row, idx, e))
    }

    /// Read a nullable integer column of any SQL integer width.
    pub fn get_integer(row: &Row, idx: usize) -> Result<Option<i64>, ServerError> {
        if let Ok(v) = row.try_get::<i32, _>(idx) {
            return Ok(v.map(i64::from));
        }
        if let Ok(v) = row.try_get::<i64, _>(idx) {
            return Ok(v);
        }
        if let Ok(v) = row.try_get::<i16, _>(idx) {
            return Ok(v.map(i64::from));
        }
        // TINYINT is unsigned in tiberius
        row.try_get::<u8, _>(idx)
            .map(|v| v.map(i64::from))
            .map_err(|e| column_error(row, idx, e))
    }

    /// Read a nullable timestamp column.
    pub fn get_timestamp(row: &Row, idx: usize) -> Result<Option<SqlTimestamp>, ServerError> {
        if let Ok(v) = row.try_get::<NaiveDateTime, _>(idx) {
            return Ok(v.map(SqlTimestamp::Naive));
        }
        if let Ok(v) = row.try_get::<NaiveDate, _>(idx) {
            return Ok(v.map(SqlTimestamp::from_date));
        }
        row.try_get::<DateTime<FixedOffset>, _>(idx)
            .map(|v| v.map(SqlTimestamp::WithOffset))
            .map_err(|e| column_error(row, idx, e))
    }
}

fn column_error(row: &Row, idx: usize, e: tiberius::error::Error) -> ServerError {
    let name = row
        .columns()
        .get(idx)
        .map(|c| c.name().to_string())
        .unwrap_or_else(|| format!("#{}", idx));
    ServerError::query(format!("Failed to read column '{}': {}", name, e))
}
