// JSON encoding of stored collections

use crate::error::{StoreError, StoreResult};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Field that identifies a record within a collection
pub const ID_FIELD: &str = "id";

/// Decode the stored text of a collection
///
/// Fails with `Malformed` if the text is not JSON and `NotACollection` if it
/// parses to anything other than an array.
pub fn decode_collection(key: &str, raw: &str) -> StoreResult<Vec<Value>> {
    let value: Value = serde_json::from_str(raw).map_err(|e| StoreError::malformed(key, e))?;

    match value {
        Value::Array(items) => Ok(items),
        other => {
            warn!(key, kind = value_kind(&other), "Stored value is not an array");
            Err(StoreError::NotACollection { key: key.to_string() })
        }
    }
}

/// Encode any serializable value as compact JSON text
pub fn encode<T: Serialize + ?Sized>(data: &T) -> StoreResult<String> {
    Ok(serde_json::to_string(data)?)
}

/// Index of the first item whose `id` field equals `id`
///
/// Items that are not objects, or objects without an `id`, never match.
pub fn position_by_id(items: &[Value], id: &Value) -> Option<usize> {
    items
        .iter()
        .position(|item| item.get(ID_FIELD).is_some_and(|stored| ids_equal(stored, id)))
}

/// Strict id equality with a single numeric domain: `1` and `1.0` are the
/// same id, `1` and `"1"` are not
pub fn ids_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
