//! Record <-> stored item conversion.
//!
//! Serialization starts from the record's serde form (its canonical JSON) and
//! rewrites each declared field by type: basic values pass through, temporal
//! values become their numeric encodings, everything else keeps its canonical
//! JSON form. Deserialization reverses the temporal encodings and hands the
//! resulting mapping to serde, which is the single validation point.
//!
//! Date-times are read as UTC whether the record holds an offset-aware or a
//! naive value. Decoding first offers serde the RFC 3339 form and, if the
//! record rejects it, the naive form.

use crate::errors::OdmError;
use crate::model::Model;
use crate::schema::{FieldType, Schema};
use crate::temporal;
use crate::types::{Item, KEY_FIELD, json_type_name};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde_json::Value;

/// Stored key value left behind by an old serialization bug; treated as no item at all.
pub const NONE_KEY_SENTINEL: &str = "None";

/// Serialize a record into a store-safe mapping, skipping `exclude`d fields and an unset key.
///
/// # Errors
/// `Validation` if the record does not serialize to a mapping or a temporal field
/// holds something other than its canonical string form.
pub fn serialize<M: Model>(record: &M, exclude: &[&str]) -> Result<Item, OdmError> {
    serialize_value(M::schema(), serde_json::to_value(record)?, exclude)
}

/// Schema-driven serialization of a record already in its serde JSON form.
///
/// # Errors
/// See [`serialize`].
pub fn serialize_value(schema: &Schema, record: Value, exclude: &[&str]) -> Result<Item, OdmError> {
    let mut raw = match record {
        Value::Object(m) => m,
        other => {
            return Err(OdmError::Validation(format!(
                "record must serialize to a mapping, got {}",
                json_type_name(&other)
            )));
        }
    };
    let mut out = Item::with_capacity(schema.len());
    for field in schema.fields() {
        let name = field.name();
        if exclude.contains(&name) {
            continue;
        }
        let value = raw.remove(name).unwrap_or(Value::Null);
        if name == KEY_FIELD && key_is_unset(&value) {
            continue;
        }
        let encoded = if value.is_null() { Value::Null } else { encode_field(name, field.field_type(), value)? };
        out.insert(name.to_owned(), encoded);
    }
    Ok(out)
}

/// Build a record from a stored item.
///
/// # Errors
/// `Validation` when the decoded mapping is rejected by the record's serde implementation.
pub fn deserialize<M: Model>(item: &Item) -> Result<M, OdmError> {
    let schema = M::schema();
    let value = deserialize_value(schema, item);
    match serde_json::from_value(value) {
        Ok(record) => Ok(record),
        Err(e) if has_datetime(schema) => {
            let naive = decode_item(schema, item, DateTimeForm::Naive);
            serde_json::from_value(naive).map_err(|_| OdmError::Validation(e.to_string()))
        }
        Err(e) => Err(OdmError::Validation(e.to_string())),
    }
}

/// Schema-driven decoding of a stored item into the record's serde JSON form.
///
/// Absent and null fields are left out so serde applies the record's own
/// defaults (`None` for optional fields). Date-times come out as RFC 3339 UTC strings.
#[must_use]
pub fn deserialize_value(schema: &Schema, item: &Item) -> Value {
    decode_item(schema, item, DateTimeForm::Rfc3339)
}

/// String form handed to serde for a decoded date-time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateTimeForm {
    /// `2023-05-17T12:30:00Z`, accepted by `DateTime<Utc>` and `DateTime<FixedOffset>`.
    Rfc3339,
    /// `2023-05-17T12:30:00`, accepted by `NaiveDateTime`.
    Naive,
}

fn decode_item(schema: &Schema, item: &Item, form: DateTimeForm) -> Value {
    let mut out = Item::with_capacity(schema.len());
    for field in schema.fields() {
        match item.get(field.name()) {
            None | Some(Value::Null) => {}
            Some(stored) => {
                out.insert(field.name().to_owned(), decode_field(field.field_type(), stored, form));
            }
        }
    }
    Value::Object(out)
}

fn has_datetime(schema: &Schema) -> bool {
    schema.fields().any(|f| *f.field_type().effective() == FieldType::DateTime)
}

/// No item, or an item whose key is the literal `"None"` string.
#[must_use]
pub fn is_missing(item: Option<&Item>) -> bool {
    item.is_none_or(|i| i.get(KEY_FIELD).and_then(Value::as_str) == Some(NONE_KEY_SENTINEL))
}

/// Decode a looked-up item, folding a miss or a validation failure into `NotFound`.
///
/// # Errors
/// `NotFound` for a missing item, the `"None"` key sentinel, or an item that fails validation.
pub fn deserialize_found<M: Model>(item: Option<Item>, key: &str) -> Result<M, OdmError> {
    let Some(item) = item.filter(|i| !is_missing(Some(i))) else {
        return Err(OdmError::NotFound(format!("no item matching key '{key}'")));
    };
    deserialize(&item).map_err(|e| {
        log::debug!("item '{key}' failed validation: {e}");
        OdmError::NotFound(format!("item '{key}' could not be read: {e}"))
    })
}

fn key_is_unset(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn encode_field(name: &str, ty: &FieldType, value: Value) -> Result<Value, OdmError> {
    if ty.is_basic() {
        return Ok(value);
    }
    let invalid = |detail: String| OdmError::Validation(format!("field '{name}': {detail}"));
    let encoded = match (ty.effective(), &value) {
        (FieldType::DateTime, Value::String(s)) => {
            let dt = match DateTime::parse_from_rfc3339(s) {
                Ok(dt) => dt.with_timezone(&Utc),
                Err(e) => s.parse::<NaiveDateTime>().map_err(|_| invalid(e.to_string()))?.and_utc(),
            };
            Some(Value::from(temporal::encode_datetime(&dt)))
        }
        (FieldType::Date, Value::String(s)) => {
            let d = s.parse::<NaiveDate>().map_err(|e| invalid(e.to_string()))?;
            Some(Value::from(temporal::encode_date(&d)))
        }
        (FieldType::Time, Value::String(s)) => {
            let t = s.parse::<NaiveTime>().map_err(|e| invalid(e.to_string()))?;
            Some(Value::from(temporal::encode_time(&t)))
        }
        // Records serialized with a numeric representation are already encoded.
        (FieldType::DateTime | FieldType::Date | FieldType::Time, Value::Number(_)) => None,
        (t @ (FieldType::DateTime | FieldType::Date | FieldType::Time), v) => {
            return Err(invalid(format!("expected {t} in canonical string form, got {}", json_type_name(v))));
        }
        _ => None,
    };
    Ok(encoded.unwrap_or(value))
}

fn decode_field(ty: &FieldType, stored: &Value, form: DateTimeForm) -> Value {
    if ty.is_basic() {
        return stored.clone();
    }
    let decoded = match ty.effective() {
        FieldType::DateTime => stored.as_f64().and_then(temporal::decode_datetime).map(|dt| {
            Value::String(match form {
                DateTimeForm::Rfc3339 => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                DateTimeForm::Naive => dt.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            })
        }),
        FieldType::Date => as_integer(stored)
            .and_then(temporal::decode_date)
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
        FieldType::Time => as_integer(stored)
            .and_then(temporal::decode_time)
            .map(|t| Value::String(t.format("%H:%M:%S%.6f").to_string())),
        _ => match stored {
            // Structured values some clients store as JSON text.
            Value::String(s) => serde_json::from_str::<Value>(s)
                .ok()
                .filter(|v| v.is_object() || v.is_array()),
            _ => None,
        },
    };
    // Anything that does not decode is passed through for serde to accept or reject.
    decoded.unwrap_or_else(|| stored.clone())
}

fn as_integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
