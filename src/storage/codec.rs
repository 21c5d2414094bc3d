//! Document codec.
//!
//! Serializes the ordered job collection to its on-disk JSON form and back.
//!
//! # Document Layout
//!
//! The store writes a versioned envelope:
//!
//! ```json
//! {
//!   "format": "printlog",
//!   "version": 1,
//!   "checksum": "<sha256 of the compact records array>",
//!   "records": [ { "id": "job_...", "timestamp": "...", ... } ]
//! }
//! ```
//!
//! A bare top-level array of objects is also accepted on decode. That is the
//! layout of older documents and of plain JSON backups.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{Collection, Record};
use crate::storage::hash::records_checksum;

/// Value of the envelope's `format` field.
pub const FORMAT_NAME: &str = "printlog";

/// Newest envelope version this build reads and the one it writes.
pub const FORMAT_VERSION: u64 = 1;

#[derive(Serialize)]
struct Envelope<'a> {
    format: &'a str,
    version: u64,
    checksum: String,
    records: &'a [Record],
}

/// How a document was laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Zero-length or whitespace-only document.
    Empty,
    /// Bare array of records.
    Legacy,
    /// Versioned envelope.
    Envelope,
}

/// Outcome of checking the envelope checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChecksumState {
    Verified,
    /// Legacy and empty documents carry no checksum.
    Absent,
    Mismatch { stored: String, computed: String },
}

/// Summary of a document, as reported by `printlog status`.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub layout: Layout,
    pub version: Option<u64>,
    pub records: usize,
    pub checksum: ChecksumState,
}

/// Encode a collection as a pretty-printed envelope with a trailing newline.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(records: &[Record]) -> Result<Vec<u8>> {
    let envelope = Envelope {
        format: FORMAT_NAME,
        version: FORMAT_VERSION,
        checksum: records_checksum(records)?,
        records,
    };
    let mut bytes = serde_json::to_vec_pretty(&envelope)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode a document into its collection.
///
/// # Errors
///
/// Returns `Error::Format` if the bytes are not valid JSON, the top level is
/// neither an envelope nor an array, an element is not an object, or the
/// envelope checksum does not match its records.
pub fn decode(bytes: &[u8]) -> Result<Collection> {
    let (records, info) = parse(bytes)?;
    if let ChecksumState::Mismatch { stored, computed } = info.checksum {
        return Err(Error::Format(format!(
            "checksum mismatch (stored {stored}, computed {computed})"
        )));
    }
    Ok(records)
}

/// Describe a document without rejecting a checksum mismatch.
///
/// # Errors
///
/// Returns `Error::Format` for the same structural problems as [`decode`].
pub fn inspect(bytes: &[u8]) -> Result<DocumentInfo> {
    parse(bytes).map(|(_, info)| info)
}

fn parse(bytes: &[u8]) -> Result<(Collection, DocumentInfo)> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        let info = DocumentInfo {
            layout: Layout::Empty,
            version: None,
            records: 0,
            checksum: ChecksumState::Absent,
        };
        return Ok((Vec::new(), info));
    }

    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| Error::Format(format!("invalid JSON: {e}")))?;

    match value {
        Value::Array(items) => {
            let records = records_from_values(items)?;
            let info = DocumentInfo {
                layout: Layout::Legacy,
                version: None,
                records: records.len(),
                checksum: ChecksumState::Absent,
            };
            Ok((records, info))
        }
        Value::Object(mut map) if map.contains_key("records") => {
            match map.get("format").and_then(Value::as_str) {
                Some(FORMAT_NAME) => {}
                other => {
                    return Err(Error::Format(format!(
                        "unknown document format: {}",
                        other.unwrap_or("<missing>")
                    )));
                }
            }

            let version = map
                .get("version")
                .and_then(Value::as_u64)
                .ok_or_else(|| Error::Format("missing document version".to_string()))?;
            if version == 0 || version > FORMAT_VERSION {
                return Err(Error::Format(format!(
                    "unsupported document version {version} (reads up to {FORMAT_VERSION})"
                )));
            }

            let Some(Value::Array(items)) = map.remove("records") else {
                return Err(Error::Format("\"records\" must be an array".to_string()));
            };
            let records = records_from_values(items)?;

            let checksum = match map.get("checksum").and_then(Value::as_str) {
                Some(stored) => {
                    let computed = records_checksum(&records)?;
                    if stored == computed {
                        ChecksumState::Verified
                    } else {
                        ChecksumState::Mismatch {
                            stored: stored.to_string(),
                            computed,
                        }
                    }
                }
                None => ChecksumState::Absent,
            };

            let info = DocumentInfo {
                layout: Layout::Envelope,
                version: Some(version),
                records: records.len(),
                checksum,
            };
            Ok((records, info))
        }
        _ => Err(Error::Format(
            "top-level value must be a sequence of records".to_string(),
        )),
    }
}

fn records_from_values(items: Vec<Value>) -> Result<Collection> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => Ok(Record::from_fields(fields)),
            other => Err(Error::Format(format!(
                "record {index} is not an object (found {})",
                json_kind(&other)
            ))),
        })
        .collect()
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        let Value::Object(map) = value else {
            panic!("expected object");
        };
        Record::from_fields(map)
    }

    fn sample() -> Collection {
        vec![
            record(json!({
                "id": "job_1",
                "timestamp": "2025-01-20T10:00:00.000Z",
                "name": "Benchy",
                "material": "PLA",
                "photo": "uploads/benchy.jpg",
            })),
            record(json!({
                "zeta": 1,
                "alpha": {"nested": [1, 2.5, null]},
                "id": "job_2",
                "timestamp": "2025-01-21T10:00:00.000Z",
            })),
        ]
    }

    #[test]
    fn test_round_trip_preserves_field_order() {
        let records = sample();
        let decoded = decode(&encode(&records).unwrap()).unwrap();

        assert_eq!(decoded, records);
        let keys: Vec<&str> = decoded[1].fields().keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "id", "timestamp"]);
    }

    #[test]
    fn test_encode_is_deterministic_and_readable() {
        let records = sample();
        let first = encode(&records).unwrap();
        let second = encode(&records).unwrap();

        assert_eq!(first, second);
        let text = String::from_utf8(first).unwrap();
        assert!(text.starts_with("{\n  \"format\": \"printlog\""));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(decode(b"").unwrap().is_empty());
        assert!(decode(b"  \n").unwrap().is_empty());
        assert!(decode(&encode(&[]).unwrap()).unwrap().is_empty());
    }

    #[test]
    fn test_decode_legacy_array() {
        let decoded = decode(br#"[{"id":"job_1","material":"PLA"}]"#).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].id(), Some("job_1"));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(decode(b"[{\"id\":"), Err(Error::Format(_))));
        assert!(matches!(decode(b"{\"id\":\"job_1\"}"), Err(Error::Format(_))));
        assert!(matches!(decode(b"[1, 2]"), Err(Error::Format(_))));
        assert!(matches!(decode(b"\"text\""), Err(Error::Format(_))));
    }

    #[test]
    fn test_decode_rejects_checksum_mismatch() {
        let bytes = encode(&sample()).unwrap();
        let tampered = String::from_utf8(bytes).unwrap().replace("Benchy", "Boat");

        let err = decode(tampered.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Format(msg) if msg.contains("checksum")));

        let info = inspect(tampered.as_bytes()).unwrap();
        assert!(matches!(info.checksum, ChecksumState::Mismatch { .. }));
    }

    #[test]
    fn test_decode_rejects_unknown_format_and_version() {
        let other = br#"{"format":"other","version":1,"records":[]}"#;
        assert!(matches!(decode(other), Err(Error::Format(_))));

        let future = br#"{"format":"printlog","version":99,"records":[]}"#;
        assert!(matches!(decode(future), Err(Error::Format(_))));
    }

    #[test]
    fn test_inspect_reports_layout() {
        let info = inspect(&encode(&sample()).unwrap()).unwrap();
        assert_eq!(info.layout, Layout::Envelope);
        assert_eq!(info.version, Some(FORMAT_VERSION));
        assert_eq!(info.records, 2);
        assert_eq!(info.checksum, ChecksumState::Verified);

        let legacy = inspect(b"[]").unwrap();
        assert_eq!(legacy.layout, Layout::Legacy);
        assert_eq!(legacy.checksum, ChecksumState::Absent);
    }
}
