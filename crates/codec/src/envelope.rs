#![forbid(unsafe_code)]

use arcadia_core::Record;
use serde_json::Value;
use tracing::warn;

/// Decode a list response. Accepts a bare array or a `{ status, data }` envelope;
/// anything else decodes to an empty list. Entries without a usable id are dropped.
pub fn decode_list(body: Value) -> Vec<Record> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                warn!(status = ?obj.get("status"), "codec: list response without data array");
                return Vec::new();
            }
        },
        other => {
            warn!(kind = json_kind(&other), "codec: unexpected list response");
            return Vec::new();
        }
    };
    let total = items.len();
    let records: Vec<Record> = items.into_iter().filter_map(Record::from_value).collect();
    if records.len() < total {
        warn!(dropped = total - records.len(), total, "codec: dropped records without id");
    }
    records
}

/// Decode a single-record response (bare object or `{ status, data }`).
/// `None` when the backend answered without a usable record.
pub fn decode_one(body: Value) -> Option<Record> {
    match body {
        Value::Object(mut obj) if !obj.contains_key("id") => obj.remove("data").and_then(Record::from_value),
        other => Record::from_value(other),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
