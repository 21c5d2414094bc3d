//! CSV rendering for job spreadsheets.
//!
//! One column per distinct field name, in the order names are first seen
//! across the collection, so `id` and `timestamp` lead for store-created
//! records.

use serde_json::Value;

use crate::csv_escape;
use crate::model::Record;

/// Distinct field names in first-seen order.
#[must_use]
pub fn collect_columns(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in record.fields().keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Render a single cell. Strings are written as-is, null and missing
/// fields are empty, anything else is compact JSON.
#[must_use]
pub fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Render records as CSV with a header row, one line per record.
#[must_use]
pub fn render_csv(records: &[Record]) -> String {
    let columns = collect_columns(records);
    let mut out = String::new();

    let header: Vec<String> = columns.iter().map(|c| csv_escape(c)).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|c| csv_escape(&render_cell(record.get(c))))
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
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

    #[test]
    fn test_columns_in_first_seen_order() {
        let records = vec![
            record(json!({"id": "job_1", "material": "PLA"})),
            record(json!({"id": "job_2", "photo": "uploads/a.jpg", "material": "ABS"})),
        ];
        assert_eq!(collect_columns(&records), ["id", "material", "photo"]);
    }

    #[test]
    fn test_render_csv_quotes_and_blanks() {
        let records = vec![
            record(json!({"id": "job_1", "notes": "stringing, minor"})),
            record(json!({"id": "job_2", "grams": 12.5, "tags": ["a", "b"], "notes": null})),
        ];

        let csv = render_csv(&records);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "id,notes,grams,tags");
        assert_eq!(lines[1], "job_1,\"stringing, minor\",,");
        assert_eq!(lines[2], "job_2,,12.5,\"[\"\"a\"\",\"\"b\"\"]\"");
    }

    #[test]
    fn test_render_csv_empty() {
        assert_eq!(render_csv(&[]), "\n");
    }
}
