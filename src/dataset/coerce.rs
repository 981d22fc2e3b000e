use chrono::{NaiveDate, NaiveDateTime};

use super::value::Scalar;
use crate::error::AppError;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M",
];

/// How a column is read once the query has been materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Date,
}

/// Parse a date ("2024-01-05", "05/01/2024", "2024-01-05 10:30:00" ...).
/// Returns None for empty or unparseable strings; a time part is dropped.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parse a number that may contain spaces or non-breaking spaces ("12 500" → 12500).
/// NaN and infinities are rejected.
pub fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Load-time coercion: anything that cannot be read as `kind` becomes `Missing`.
pub fn coerce_cell(value: Scalar, kind: ColumnKind) -> Scalar {
    match (kind, value) {
        (_, Scalar::Missing) => Scalar::Missing,
        (ColumnKind::Numeric, v @ (Scalar::Integer(_) | Scalar::Real(_))) => {
            if v.as_f64().is_some() {
                v
            } else {
                Scalar::Missing
            }
        }
        (ColumnKind::Numeric, Scalar::Text(t)) => match parse_number(&t) {
            Some(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Scalar::Integer(n as i64),
            Some(n) => Scalar::Real(n),
            None => Scalar::Missing,
        },
        (ColumnKind::Numeric, Scalar::Date(_)) => Scalar::Missing,
        (ColumnKind::Date, d @ Scalar::Date(_)) => d,
        (ColumnKind::Date, Scalar::Text(t)) => {
            parse_date(&t).map(Scalar::Date).unwrap_or(Scalar::Missing)
        }
        (ColumnKind::Date, _) => Scalar::Missing,
    }
}

/// Projection-time numeric read. `Missing` is `Ok(None)`; a cell that cannot
/// be read as a number is a coercion error.
pub fn numeric_value(column: &str, value: &Scalar) -> Result<Option<f64>, AppError> {
    match value {
        Scalar::Missing => Ok(None),
        Scalar::Integer(_) | Scalar::Real(_) => Ok(value.as_f64()),
        Scalar::Text(t) => parse_number(t)
            .map(Some)
            .ok_or_else(|| coercion_error(column, value, "a number")),
        Scalar::Date(_) => Err(coercion_error(column, value, "a number")),
    }
}

/// Projection-time date read, same contract as [`numeric_value`].
pub fn date_value(column: &str, value: &Scalar) -> Result<Option<NaiveDate>, AppError> {
    match value {
        Scalar::Missing => Ok(None),
        Scalar::Date(d) => Ok(Some(*d)),
        Scalar::Text(t) => parse_date(t)
            .map(Some)
            .ok_or_else(|| coercion_error(column, value, "a date")),
        Scalar::Integer(_) | Scalar::Real(_) => Err(coercion_error(column, value, "a date")),
    }
}

fn coercion_error(column: &str, value: &Scalar, expected: &'static str) -> AppError {
    AppError::Coercion {
        column: column.to_string(),
        value: value.to_string(),
        expected,
    }
}
