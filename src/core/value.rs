use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{DbError, Result};

/// A typed SQL value as it travels between a record descriptor, a bound
/// statement parameter, and a stored row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Uuid(uuid::Uuid),
    Json(serde_json::Value),
    Range(Box<RangeValue>),
}

/// A half-open or closed interval stored as a single scalar.
///
/// Rendered as one PostgreSQL-style range literal (`[lo,hi)` or
/// `[lo,hi]`). Kept boxed inside [`Value`] so generic code can never
/// mistake it for an iterable collection of two values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeValue {
    pub start: Value,
    pub end: Value,
    pub inclusive_end: bool,
}

impl RangeValue {
    pub fn half_open(start: impl Into<Value>, end: impl Into<Value>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            inclusive_end: false,
        }
    }

    pub fn closed(start: impl Into<Value>, end: impl Into<Value>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            inclusive_end: true,
        }
    }

    /// Canonical literal form, e.g. `[2026-01-01,2026-02-01)`.
    pub fn to_literal(&self) -> String {
        format!(
            "[{},{}{}",
            endpoint_literal(&self.start),
            endpoint_literal(&self.end),
            if self.inclusive_end { ']' } else { ')' }
        )
    }

    /// Parse a range literal back into an interval. The endpoint type is
    /// recovered from the text itself (timestamp, date, number, text).
    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();
        if !s.starts_with('[') {
            return Err(DbError::TypeMismatch(format!(
                "Invalid range literal: {input}"
            )));
        }
        let inclusive_end = match s.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => {
                return Err(DbError::TypeMismatch(format!(
                    "Invalid range literal: {input}"
                )));
            }
        };
        let inner = &s[1..s.len() - 1];
        let (lo, hi) = inner.split_once(',').ok_or_else(|| {
            DbError::TypeMismatch(format!("Range literal missing separator: {input}"))
        })?;

        Ok(Self {
            start: parse_endpoint(lo),
            end: parse_endpoint(hi),
            inclusive_end,
        })
    }
}

fn endpoint_literal(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Timestamp(ts) => ts.to_rfc3339(),
        Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        other => other.to_string(),
    }
}

fn parse_endpoint(raw: &str) -> Value {
    let s = raw.trim();
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Value::Timestamp(ts.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Value::Date(d);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    Value::Text(s.to_string())
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Text(_) => "TEXT",
            Self::Boolean(_) => "BOOLEAN",
            Self::Timestamp(_) => "TIMESTAMP",
            Self::Date(_) => "DATE",
            Self::Uuid(_) => "UUID",
            Self::Json(_) => "JSON",
            Self::Range(_) => "RANGE",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => {
                if a.is_nan() && b.is_nan() {
                    return true;
                }
                (a - b).abs() < f64::EPSILON
            }
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Uuid(a), Self::Uuid(b)) => a == b,
            (Self::Json(a), Self::Json(b)) => a == b,
            (Self::Range(a), Self::Range(b)) => a == b,
            // Implicit coercion between the numeric types
            (Self::Integer(i), Self::Float(f)) | (Self::Float(f), Self::Integer(i)) => {
                (*i as f64 - f).abs() < f64::EPSILON
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Text(s) => write!(f, "{}", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Uuid(u) => write!(f, "{}", u),
            Self::Json(j) => write!(f, "{}", j),
            Self::Range(r) => write!(f, "{}", r.to_literal()),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<uuid::Uuid> for Value {
    fn from(u: uuid::Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<serde_json::Value> for Value {
    fn from(j: serde_json::Value) -> Self {
        Self::Json(j)
    }
}

impl From<RangeValue> for Value {
    fn from(r: RangeValue) -> Self {
        Self::Range(Box::new(r))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Float,
    Text,
    Boolean,
    Timestamp,
    Date,
    Uuid,
    Json,
    Range,
}

impl DataType {
    pub fn is_compatible(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Integer, Value::Integer(_)) => true,
            (Self::Float, Value::Float(_)) => true,
            (Self::Float, Value::Integer(_)) => true,
            (Self::Text, Value::Text(_)) => true,
            (Self::Boolean, Value::Boolean(_)) => true,
            (Self::Timestamp, Value::Timestamp(_)) => true,
            (Self::Date, Value::Date(_)) => true,
            (Self::Uuid, Value::Uuid(_)) => true,
            (Self::Json, Value::Json(_)) => true,
            (Self::Range, Value::Range(_)) => true,
            _ => false,
        }
    }

    /// Cast a value into this column type. Text literals coerce into the
    /// richer types by parsing, which is how bound parameters for
    /// timestamp, uuid, json and range columns arrive off the wire.
    pub fn cast_value(&self, value: &Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match (self, value) {
            (Self::Integer, Value::Integer(_))
            | (Self::Float, Value::Float(_))
            | (Self::Text, Value::Text(_))
            | (Self::Boolean, Value::Boolean(_))
            | (Self::Timestamp, Value::Timestamp(_))
            | (Self::Date, Value::Date(_))
            | (Self::Uuid, Value::Uuid(_))
            | (Self::Json, Value::Json(_))
            | (Self::Range, Value::Range(_)) => Ok(value.clone()),

            (Self::Integer, Value::Float(f)) => Ok(Value::Integer(*f as i64)),
            (Self::Float, Value::Integer(i)) => Ok(Value::Float(*i as f64)),

            (Self::Timestamp, Value::Text(s)) => DateTime::parse_from_rfc3339(s)
                .map(|ts| Value::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|e| DbError::TypeMismatch(format!("Invalid timestamp '{s}': {e}"))),
            (Self::Date, Value::Text(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|e| DbError::TypeMismatch(format!("Invalid date '{s}': {e}"))),
            (Self::Uuid, Value::Text(s)) => uuid::Uuid::parse_str(s)
                .map(Value::Uuid)
                .map_err(|e| DbError::TypeMismatch(format!("Invalid uuid '{s}': {e}"))),
            (Self::Json, Value::Text(s)) => serde_json::from_str(s)
                .map(Value::Json)
                .map_err(|e| DbError::TypeMismatch(format!("Invalid json '{s}': {e}"))),
            (Self::Range, Value::Text(s)) => {
                RangeValue::parse(s).map(|r| Value::Range(Box::new(r)))
            }

            _ => Err(DbError::TypeMismatch(format!(
                "Expected {}, got {}",
                self,
                value.type_name()
            ))),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "INTEGER"),
            Self::Float => write!(f, "FLOAT"),
            Self::Text => write!(f, "TEXT"),
            Self::Boolean => write!(f, "BOOLEAN"),
            Self::Timestamp => write!(f, "TIMESTAMP"),
            Self::Date => write!(f, "DATE"),
            Self::Uuid => write!(f, "UUID"),
            Self::Json => write!(f, "JSON"),
            Self::Range => write!(f, "RANGE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::Integer(42), Value::Integer(42));
        assert_eq!(Value::Integer(1), Value::Float(1.0));
        assert_ne!(Value::Integer(1), Value::Integer(2));
        assert_ne!(Value::Text("1".into()), Value::Integer(1));
    }

    #[test]
    fn test_type_compatibility() {
        assert!(DataType::Integer.is_compatible(&Value::Integer(42)));
        assert!(DataType::Integer.is_compatible(&Value::Null));
        assert!(!DataType::Integer.is_compatible(&Value::Text("hello".into())));
    }

    #[test]
    fn test_range_literal_round_trip() {
        let range = RangeValue::half_open(
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        );
        let literal = range.to_literal();
        assert_eq!(literal, "[2026-01-01,2026-02-01)");
        assert_eq!(RangeValue::parse(&literal).unwrap(), range);
    }

    #[test]
    fn test_range_closed_end() {
        let range = RangeValue::closed(1i64, 10i64);
        assert_eq!(range.to_literal(), "[1,10]");
        assert!(RangeValue::parse("[1,10]").unwrap().inclusive_end);
    }

    #[test]
    fn test_text_coerces_into_range_column() {
        let cast = DataType::Range
            .cast_value(&Value::Text("[2026-01-01,2026-02-01)".into()))
            .unwrap();
        let Value::Range(range) = cast else {
            panic!("expected a range, got {cast:?}");
        };
        assert!(!range.inclusive_end);
    }
}
