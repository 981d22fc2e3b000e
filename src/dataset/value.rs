use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use super::coerce::{parse_date, parse_number};

/// One cell of a result set.
///
/// `Missing` stands for SQL NULL as well as any cell that failed load-time
/// coercion; it serializes as JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Missing,
    Integer(i64),
    Real(f64),
    Text(String),
    Date(NaiveDate),
}

impl Scalar {
    pub fn text(s: impl Into<String>) -> Self {
        Scalar::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Scalar::Missing)
    }

    /// Numeric view of the cell. Only `Integer` and `Real` qualify.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Real(r) if r.is_finite() => Some(*r),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Scalar::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Equality used by dropdown filters.
    ///
    /// Integers and reals compare by value, a date equals a text that parses
    /// to the same day, a text equals a number it parses to. `Missing` never
    /// matches, not even another `Missing`.
    pub fn matches(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Missing, _) | (_, Scalar::Missing) => false,
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            (Scalar::Date(a), Scalar::Date(b)) => a == b,
            (Scalar::Date(d), Scalar::Text(t)) | (Scalar::Text(t), Scalar::Date(d)) => {
                parse_date(t) == Some(*d)
            }
            (Scalar::Text(t), n) | (n, Scalar::Text(t)) => match (parse_number(t), n.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Converts a JSON value coming from a UI control.
    pub fn from_json(value: &serde_json::Value) -> Scalar {
        match value {
            serde_json::Value::Null => Scalar::Missing,
            serde_json::Value::Bool(b) => Scalar::Integer(*b as i64),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Scalar::Integer(i),
                None => n.as_f64().map(Scalar::Real).unwrap_or(Scalar::Missing),
            },
            serde_json::Value::String(s) => Scalar::Text(s.clone()),
            other => Scalar::Text(other.to_string()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Missing => Ok(()),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Real(r) => write!(f, "{}", r),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Integer(i)
    }
}

impl From<f64> for Scalar {
    fn from(r: f64) -> Self {
        Scalar::Real(r)
    }
}

impl From<NaiveDate> for Scalar {
    fn from(d: NaiveDate) -> Self {
        Scalar::Date(d)
    }
}
