//! Record model.
//!
//! Records keep their fields in insertion order so a document written by
//! the store reads back exactly as it was encoded.

use chrono::{DateTime, Datelike, Duration, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Store-managed identifier field.
pub const ID_FIELD: &str = "id";

/// Store-managed last-modified field.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Last year a four-digit RFC 3339 timestamp can hold.
const MAX_TIMESTAMP_YEAR: i32 = 9999;

/// Ordered field mapping.
pub type Fields = serde_json::Map<String, Value>;

/// The full ordered set of records, the unit of persistence.
pub type Collection = Vec<Record>;

/// A single tracked print job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Fields,
}

impl Record {
    /// Build a fresh record with store-managed fields placed first.
    ///
    /// Any `id` or `timestamp` keys in `fields` are discarded.
    #[must_use]
    pub fn new(id: String, timestamp: DateTime<Utc>, fields: Fields) -> Self {
        let mut ordered = Fields::new();
        ordered.insert(ID_FIELD.to_string(), Value::String(id));
        ordered.insert(
            TIMESTAMP_FIELD.to_string(),
            Value::String(format_timestamp(timestamp)),
        );
        for (key, value) in fields {
            if !is_managed(&key) {
                ordered.insert(key, value);
            }
        }
        Self { fields: ordered }
    }

    /// Wrap an existing mapping verbatim (used by decode and restore).
    #[must_use]
    pub fn from_fields(fields: Fields) -> Self {
        Self { fields }
    }

    /// The record's identifier, if it has a string one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.fields.get(ID_FIELD).and_then(Value::as_str)
    }

    /// The raw timestamp string, if present.
    #[must_use]
    pub fn timestamp(&self) -> Option<&str> {
        self.fields.get(TIMESTAMP_FIELD).and_then(Value::as_str)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Shallow-merge `incoming` into this record.
    ///
    /// Same-named fields are overwritten in place, new fields are appended,
    /// and store-managed fields are never taken from the caller.
    pub fn merge(&mut self, incoming: Fields) {
        for (key, value) in incoming {
            if !is_managed(&key) {
                self.fields.insert(key, value);
            }
        }
    }

    /// Refresh the timestamp, keeping it strictly increasing.
    ///
    /// A timestamp already at the last instant RFC 3339 can express (end of
    /// year 9999) stays there, so it never goes backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        let now = now.trunc_subsecs(3);
        let next = match self.timestamp().and_then(parse_timestamp) {
            Some(previous) if now <= previous => {
                let bumped = previous + Duration::milliseconds(1);
                if bumped.year() > MAX_TIMESTAMP_YEAR {
                    previous
                } else {
                    bumped
                }
            }
            _ => now,
        };
        self.fields.insert(
            TIMESTAMP_FIELD.to_string(),
            Value::String(format_timestamp(next)),
        );
    }
}

fn is_managed(key: &str) -> bool {
    key == ID_FIELD || key == TIMESTAMP_FIELD
}

/// Generate a new job identifier.
///
/// Collision checking against an existing collection is the store's job.
#[must_use]
pub fn generate_id() -> String {
    format!("job_{}", &uuid::Uuid::new_v4().simple().to_string()[..12])
}

/// Format an instant as RFC 3339 with millisecond precision and a `Z` suffix.
#[must_use]
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp, accepting any RFC 3339 offset.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_new_record_puts_managed_fields_first() {
        let now = Utc::now();
        let record = Record::new(
            "job_1".to_string(),
            now,
            fields(json!({"material": "PLA", "id": "spoofed", "printer": "MK4"})),
        );

        let keys: Vec<&str> = record.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, ["id", "timestamp", "material", "printer"]);
        assert_eq!(record.id(), Some("job_1"));
        assert_eq!(record.timestamp(), Some(format_timestamp(now).as_str()));
    }

    #[test]
    fn test_merge_overwrites_in_place_and_keeps_id() {
        let mut record = Record::new(
            "job_1".to_string(),
            Utc::now(),
            fields(json!({"material": "PLA", "layer_height": 0.2})),
        );

        record.merge(fields(json!({"material": "PETG", "id": "other", "notes": "warped"})));

        assert_eq!(record.id(), Some("job_1"));
        assert_eq!(record.get("material"), Some(&json!("PETG")));
        assert_eq!(record.get("layer_height"), Some(&json!(0.2)));
        let keys: Vec<&str> = record.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, ["id", "timestamp", "material", "layer_height", "notes"]);
    }

    #[test]
    fn test_touch_is_strictly_increasing() {
        let now = Utc::now();
        let mut record = Record::new("job_1".to_string(), now, Fields::new());
        let before = parse_timestamp(record.timestamp().unwrap()).unwrap();

        // Same instant, and an instant in the past, both move forward.
        record.touch(now);
        let second = parse_timestamp(record.timestamp().unwrap()).unwrap();
        assert!(second > before);

        record.touch(now - Duration::hours(1));
        let third = parse_timestamp(record.timestamp().unwrap()).unwrap();
        assert!(third > second);
    }

    #[test]
    fn test_touch_saturates_at_end_of_year_9999() {
        let mut fields = Fields::new();
        fields.insert(ID_FIELD.to_string(), json!("job_1"));
        fields.insert(TIMESTAMP_FIELD.to_string(), json!("9999-12-31T23:59:59.999Z"));
        let mut record = Record::from_fields(fields);

        record.touch(Utc::now());
        assert_eq!(record.timestamp(), Some("9999-12-31T23:59:59.999Z"));

        record.touch(Utc::now());
        assert_eq!(record.timestamp(), Some("9999-12-31T23:59:59.999Z"));
    }

    #[test]
    fn test_generate_id_shape() {
        let id = generate_id();
        assert!(id.starts_with("job_"));
        assert_eq!(id.len(), 16);
        assert_ne!(generate_id(), generate_id());
    }

    #[test]
    fn test_timestamp_format() {
        let instant = parse_timestamp("2025-01-20T10:00:00.123+02:00").unwrap();
        assert_eq!(format_timestamp(instant), "2025-01-20T08:00:00.123Z");
    }
}
