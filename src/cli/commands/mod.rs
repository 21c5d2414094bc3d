//! Command implementations.

pub mod backup;
pub mod completions;
pub mod init;
pub mod job;
pub mod status;
pub mod version;

use colored::Colorize;
use serde_json::Value;

use crate::backup::render_cell;
use crate::model::{Record, ID_FIELD, TIMESTAMP_FIELD};

/// Print a record as an indented block: id and timestamp on the first line,
/// then one `key: value` line per caller field.
pub(crate) fn print_record(record: &Record) {
    let id = record.id().unwrap_or("<no id>");
    let timestamp = record.timestamp().unwrap_or("");
    println!("{} {}", id.bold(), timestamp.dimmed());

    for (key, value) in record.fields() {
        if key == ID_FIELD || key == TIMESTAMP_FIELD {
            continue;
        }
        println!("  {}: {}", key.cyan(), display_value(value));
    }
}

/// Render a field value for human output.
fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "null".dimmed().to_string(),
        other => render_cell(Some(other)),
    }
}
