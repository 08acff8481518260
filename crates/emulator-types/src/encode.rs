//! JSON encoding policy for records.
//!
//! Temporal values render as ISO-8601 strings; every other scalar goes
//! through standard JSON encoding. Every sink encodes through this module.

use crate::record::Record;
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use serde_json::{json, Map, Number};
use thiserror::Error;

/// A value the encoder cannot represent in JSON.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("non-finite float {0} has no JSON representation")]
    NonFiniteFloat(f64),

    #[error("{len} bytes of binary data are not valid UTF-8")]
    InvalidUtf8 { len: usize },

    #[error("column '{column}': {source}")]
    Column {
        column: String,
        #[source]
        source: Box<SerializationError>,
    },

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode a single value.
pub fn encode_value(value: &Value) -> Result<serde_json::Value, SerializationError> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => json!(*b),
        Value::Int(i) => json!(*i),
        Value::UInt(u) => json!(*u),
        Value::Float(f) => Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or(SerializationError::NonFiniteFloat(*f))?,
        // Decimals stay as their exact text
        Value::Decimal(s) | Value::String(s) | Value::Duration(s) => json!(s),
        Value::Bytes(b) => match std::str::from_utf8(b) {
            Ok(s) => json!(s),
            Err(_) => return Err(SerializationError::InvalidUtf8 { len: b.len() }),
        },
        Value::Date(d) => json!(iso_date(d)),
        Value::Time(t) => json!(iso_time(t)),
        Value::DateTime(dt) => json!(iso_datetime(dt)),
    })
}

/// Encode a record as a JSON object, preserving column order.
pub fn encode_record(record: &Record) -> Result<serde_json::Value, SerializationError> {
    let mut map = Map::with_capacity(record.len());
    for (name, value) in record.fields() {
        let encoded = encode_value(value).map_err(|e| SerializationError::Column {
            column: name.to_string(),
            source: Box::new(e),
        })?;
        map.insert(name.to_string(), encoded);
    }
    Ok(serde_json::Value::Object(map))
}

/// Serialize an already-encoded envelope to bytes.
pub fn to_json_vec<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    Ok(serde_json::to_vec(value)?)
}

pub fn iso_date(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

pub fn iso_time(t: &NaiveTime) -> String {
    format!("{}{}", t.format("%H:%M:%S"), fraction(t.nanosecond()))
}

pub fn iso_datetime(dt: &NaiveDateTime) -> String {
    format!(
        "{}{}",
        dt.format("%Y-%m-%dT%H:%M:%S"),
        fraction(dt.nanosecond())
    )
}

// Microsecond precision, omitted entirely when zero.
fn fraction(nanos: u32) -> String {
    let micros = (nanos % 1_000_000_000) / 1_000;
    if micros == 0 {
        String::new()
    } else {
        format!(".{micros:06}")
    }
}
