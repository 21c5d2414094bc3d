//! Input validation for restore payloads and command-line fields.
//!
//! The store enforces no schema beyond identifier shape: a record needs a
//! non-empty string `id` that no other record in the collection shares.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{Collection, Fields, Record, ID_FIELD};
use crate::storage::codec::json_kind;

// ── Restore payloads ─────────────────────────────────────────

/// Validate an untyped restore payload and convert it to records.
///
/// # Errors
///
/// Returns `Error::Validation` if the payload is not an array of objects,
/// or if any id is missing, empty, not a string, or duplicated.
pub fn validate_restore_payload(payload: Value) -> Result<Collection> {
    let items = match payload {
        Value::Array(items) => items,
        other => {
            return Err(Error::Validation(format!(
                "expected an array of records, found {}",
                json_kind(&other)
            )));
        }
    };

    let records = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => Ok(Record::from_fields(fields)),
            other => Err(Error::Validation(format!(
                "record {index} is not an object (found {})",
                json_kind(&other)
            ))),
        })
        .collect::<Result<Collection>>()?;

    validate_collection(&records)?;
    Ok(records)
}

/// Check identifier shape and uniqueness across a collection.
///
/// # Errors
///
/// Returns `Error::Validation` naming the first offending record.
pub fn validate_collection(records: &[Record]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let id = match record.get(ID_FIELD) {
            Some(Value::String(id)) if !id.trim().is_empty() => id.as_str(),
            Some(Value::String(_)) => {
                return Err(Error::Validation(format!("record {index} has an empty id")));
            }
            Some(other) => {
                return Err(Error::Validation(format!(
                    "record {index} has a non-string id ({})",
                    json_kind(other)
                )));
            }
            None => {
                return Err(Error::Validation(format!("record {index} has no id")));
            }
        };

        if !seen.insert(id) {
            return Err(Error::Validation(format!(
                "duplicate id '{id}' at record {index}"
            )));
        }
    }

    Ok(())
}

// ── Command-line fields ──────────────────────────────────────

/// Parse a `key=value` assignment.
///
/// The value is read as JSON when it parses (`0.2`, `true`, `{"a":1}`),
/// otherwise it is kept as a plain string (`PLA`, `uploads/a.jpg`).
///
/// # Errors
///
/// Returns `Error::InvalidArgument` if there is no `=` or the key is empty.
pub fn parse_field_assignment(raw: &str) -> Result<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(Error::InvalidArgument(format!(
            "field '{raw}' must be written as key=value"
        )));
    };

    let key = key.trim();
    if key.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "field '{raw}' has an empty name"
        )));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Parse a JSON object of fields.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` if the text is not a JSON object.
pub fn parse_fields_object(raw: &str) -> Result<Fields> {
    match serde_json::from_str(raw) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(Error::InvalidArgument(format!(
            "field object must be a JSON object, found {}",
            json_kind(&other)
        ))),
        Err(e) => Err(Error::InvalidArgument(format!("field object is not valid JSON: {e}"))),
    }
}

/// Assemble caller fields from a JSON object and `key=value` assignments.
///
/// Assignments are applied after the object, in order, so they win on
/// conflicts. `photo` is shorthand for a `photo=<reference>` assignment.
///
/// # Errors
///
/// Returns the first parse error.
pub fn build_fields(json: Option<&str>, sets: &[String], photo: Option<&str>) -> Result<Fields> {
    let mut fields = match json {
        Some(raw) => parse_fields_object(raw)?,
        None => Fields::new(),
    };

    for raw in sets {
        let (key, value) = parse_field_assignment(raw)?;
        fields.insert(key, value);
    }

    if let Some(reference) = photo {
        fields.insert("photo".to_string(), Value::String(reference.to_string()));
    }

    Ok(fields)
}
