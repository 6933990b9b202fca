//! Canonical JSON for artifacts
//!
//! Artifact files and the bundle digest are both derived from a canonical
//! form: object keys sorted at every depth, two-space indentation on disk,
//! compact text for hashing. Equal values always produce equal bytes.

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Map, Serializer, Value};
use std::collections::BTreeMap;
use std::io::Write;

/// Convert `value` into a JSON tree with sorted object keys.
pub fn to_canonical_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, serde_json::Error> {
    Ok(sort_keys(serde_json::to_value(value)?))
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted.into_iter().collect::<Map<_, _>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        scalar => scalar,
    }
}

/// Write the indented canonical form of `value`.
pub fn write_canonical_json<T, W>(writer: W, value: &T) -> Result<(), serde_json::Error>
where
    T: Serialize + ?Sized,
    W: Write,
{
    let mut serializer = Serializer::with_formatter(writer, PrettyFormatter::with_indent(b"  "));
    to_canonical_value(value)?.serialize(&mut serializer)
}

/// Indented canonical form of `value` as a string.
pub fn canonical_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buffer = Vec::new();
    write_canonical_json(&mut buffer, value)?;
    // serde_json only emits UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// BLAKE3 digest (hex) of the compact canonical JSON of `value`.
pub fn canonical_digest_hex<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let compact = serde_json::to_vec(&to_canonical_value(value)?)?;
    Ok(hex::encode(blake3::hash(&compact).as_bytes()))
}
