use crate::core::data_type::DataType;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, hash::Hash};
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Null,
}

/// A cursor or query-string value could not be read as the column's type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot read '{input}' as {data_type}")]
pub struct ValueParseError {
    pub data_type: DataType,
    pub input: String,
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        use Value::*;
        std::mem::discriminant(self).hash(state);
        match self {
            Int(v) => v.hash(state),
            Float(v) => v.to_bits().hash(state),
            String(v) => v.hash(state),
            Boolean(v) => v.hash(state),
            Date(v) => v.hash(state),
            Timestamp(v) => v.hash(state),
            Null => {}
        }
    }
}

impl Value {
    /// Parses `input` as a value of `data_type`.
    ///
    /// This is the inverse of [`Value::to_position_string`]: every value
    /// stringified into a cursor position reads back unchanged. An empty
    /// string reads back as `Null` for every non-text type.
    pub fn parse_as(data_type: DataType, input: &str) -> Result<Value, ValueParseError> {
        let err = || ValueParseError {
            data_type,
            input: input.to_string(),
        };

        if input.is_empty() && data_type != DataType::String {
            return Ok(Value::Null);
        }

        match data_type {
            DataType::Int => input.parse::<i64>().map(Value::Int).map_err(|_| err()),
            DataType::Float => input.parse::<f64>().map(Value::Float).map_err(|_| err()),
            DataType::String => Ok(Value::String(input.to_string())),
            DataType::Boolean => match input {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                _ => Err(err()),
            },
            DataType::Date => NaiveDate::parse_from_str(input, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|_| err()),
            DataType::Timestamp => DateTime::parse_from_rfc3339(input)
                .map(|ts| Value::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|_| err()),
        }
    }

    /// Stable textual form used inside cursor positions.
    pub fn to_position_string(&self) -> String {
        match self {
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::String(v) => v.clone(),
            Value::Boolean(v) => v.to_string(),
            Value::Date(v) => v.format(DATE_FORMAT).to_string(),
            Value::Timestamp(v) => v.to_rfc3339_opts(SecondsFormat::Micros, true),
            Value::Null => String::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Int(v) => serde_json::Value::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(v) => serde_json::Value::String(v.clone()),
            Value::Boolean(v) => serde_json::Value::Bool(*v),
            Value::Date(v) => serde_json::Value::String(v.format(DATE_FORMAT).to_string()),
            Value::Timestamp(v) => {
                serde_json::Value::String(v.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::Null => serde_json::Value::Null,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::String(v) => v.parse::<f64>().ok(),
            Value::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Date(_) | Value::Timestamp(_) | Value::Null => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) => Some(*v as i64),
            Value::String(v) => v.parse::<i64>().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// SQL-style comparison: `None` when either side is `Null` or the types
    /// cannot be compared.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (String(a), String(b)) => Some(a.cmp(b)),
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (Timestamp(a), Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn equal(&self, other: &Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// Total order used when sorting rows: `Null` sorts after every value
    /// (as Postgres does for ascending keys) and mismatched types fall back
    /// to a fixed type rank.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            _ => self
                .compare(other)
                .unwrap_or_else(|| self.type_rank().cmp(&other.type_rank())),
        }
    }

    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Int(_) => Some(DataType::Int),
            Value::Float(_) => Some(DataType::Float),
            Value::String(_) => Some(DataType::String),
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Date(_) => Some(DataType::Date),
            Value::Timestamp(_) => Some(DataType::Timestamp),
            Value::Null => None,
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Boolean(_) => 0,
            Value::Int(_) | Value::Float(_) => 1,
            Value::String(_) => 2,
            Value::Date(_) => 3,
            Value::Timestamp(_) => 4,
            Value::Null => 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Option<Value>,
}

impl FieldValue {
    pub fn new(name: &str, value: Value) -> Self {
        FieldValue {
            name: name.to_string(),
            value: if value.is_null() { None } else { Some(value) },
        }
    }

    pub fn value_data_type(&self) -> Option<DataType> {
        self.value.as_ref().and_then(|v| v.data_type())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "'{v}'"),
            Value::Timestamp(v) => write!(
                f,
                "'{}'",
                v.to_rfc3339_opts(SecondsFormat::Micros, true)
            ),
            Value::Null => write!(f, "NULL"),
        }
    }
}
