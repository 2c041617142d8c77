use crate::errors::OdmError;
use crate::schema::FieldType;
use crate::temporal;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// A comparison value before it is normalized for the wire.
///
/// Temporal variants keep their native type so they can be checked against
/// the declared field type; [`Operand::normalize`] turns them into the
/// numeric encodings stored in the backing store.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(DateTime<Utc>),
    List(Vec<Value>),
    Map(Map<String, Value>),
}

impl Operand {
    /// Flattens a nested record into the plain mapping of its fields.
    ///
    /// # Errors
    /// Returns `InvalidQuery` when `record` does not serialize to a JSON mapping.
    pub fn record<T: Serialize>(record: &T) -> Result<Self, OdmError> {
        match serde_json::to_value(record)? {
            Value::Object(m) => Ok(Self::Map(m)),
            other => Err(OdmError::InvalidQuery(format!(
                "nested record operand must serialize to a mapping, got {}",
                crate::types::json_type_name(&other)
            ))),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) => "datetime",
            Self::List(_) => "list",
            Self::Map(_) => "mapping",
        }
    }

    /// Wire form: temporal values become their stored numeric encoding.
    #[must_use]
    pub fn normalize(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::Str(s) => Value::String(s.clone()),
            Self::Date(d) => Value::from(temporal::encode_date(d)),
            Self::Time(t) => Value::from(temporal::encode_time(t)),
            Self::DateTime(dt) => Value::from(temporal::encode_datetime(dt)),
            Self::List(items) => Value::Array(items.clone()),
            Self::Map(m) => Value::Object(m.clone()),
        }
    }

    /// Whether this operand may be compared against a field declared as `ty`.
    #[must_use]
    pub fn fits(&self, ty: &FieldType) -> bool {
        if matches!(self, Self::Null) {
            return ty.is_optional();
        }
        match (ty.effective(), self) {
            (FieldType::Str, Self::Str(_))
            | (FieldType::Int, Self::Int(_))
            | (FieldType::Float, Self::Float(_) | Self::Int(_))
            | (FieldType::Bool, Self::Bool(_))
            | (FieldType::Date, Self::Date(_))
            | (FieldType::Time, Self::Time(_))
            | (FieldType::DateTime, Self::DateTime(_))
            | (FieldType::Map | FieldType::Record, Self::Map(_)) => true,
            (FieldType::List(inner), Self::List(items)) => items.iter().all(|v| json_fits(inner, v)),
            (FieldType::Custom, op) => !matches!(op, Self::Date(_) | Self::Time(_) | Self::DateTime(_)),
            _ => false,
        }
    }
}

/// Loose structural check of an already-encoded list element.
fn json_fits(ty: &FieldType, v: &Value) -> bool {
    match (ty.effective(), v) {
        (_, Value::Null) => ty.is_optional(),
        (FieldType::Str, Value::String(_)) | (FieldType::Bool, Value::Bool(_)) => true,
        (FieldType::Int, Value::Number(n)) => n.is_i64() || n.is_u64(),
        (FieldType::Float, Value::Number(_)) => true,
        (FieldType::Map | FieldType::Record, Value::Object(_)) => true,
        (FieldType::List(inner), Value::Array(items)) => items.iter().all(|x| json_fits(inner, x)),
        (FieldType::Custom | FieldType::Date | FieldType::Time | FieldType::DateTime, _) => true,
        _ => false,
    }
}

/// Orders two normalized numeric operands; `None` for non-numbers and NaN.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compare_numbers(a: &Value, b: &Value) -> Option<Ordering> {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

impl From<bool> for Operand {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Operand {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Operand {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Operand {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Operand {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<NaiveDate> for Operand {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveTime> for Operand {
    fn from(v: NaiveTime) -> Self {
        Self::Time(v)
    }
}

impl From<DateTime<Utc>> for Operand {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl From<Map<String, Value>> for Operand {
    fn from(v: Map<String, Value>) -> Self {
        Self::Map(v)
    }
}

impl From<Vec<&str>> for Operand {
    fn from(v: Vec<&str>) -> Self {
        Self::List(v.into_iter().map(Value::from).collect())
    }
}

impl From<Vec<String>> for Operand {
    fn from(v: Vec<String>) -> Self {
        Self::List(v.into_iter().map(Value::String).collect())
    }
}

impl From<Vec<Value>> for Operand {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => n.as_i64().map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            Value::String(s) => Self::Str(s),
            Value::Array(items) => Self::List(items),
            Value::Object(m) => Self::Map(m),
        }
    }
}

impl<T: Into<Self>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
