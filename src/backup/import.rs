//! Backup import.
//!
//! Reads a backup file, validates it as a restore payload, and replaces the
//! whole collection with it. Records keep the ids and timestamps they were
//! backed up with.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::backup::types::ImportStats;
use crate::error::{Error, Result};
use crate::model::Collection;
use crate::storage::{decode, DocumentPort, RecordStore};
use crate::validate::{validate_collection, validate_restore_payload};

/// Read and validate a backup file.
///
/// Accepts a bare JSON array of records or a copy of the live document
/// envelope (whose checksum is verified).
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be read, or `Error::Validation` if
/// it is not a valid restore payload (including a damaged envelope).
pub fn read_backup(path: &Path) -> Result<Collection> {
    let bytes = fs::read(path)?;

    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| Error::Validation(format!("backup is not valid JSON: {e}")))?;

    match value {
        Value::Object(map) if map.contains_key("records") => {
            // A damaged backup is bad restore input, not a damaged live document.
            let records = decode(&bytes).map_err(|e| match e {
                Error::Format(msg) => Error::Validation(msg),
                other => other,
            })?;
            validate_collection(&records)?;
            Ok(records)
        }
        other => validate_restore_payload(other),
    }
}

/// Importer for backup files.
pub struct Importer<'a, P: DocumentPort> {
    store: &'a RecordStore<P>,
}

impl<'a, P: DocumentPort> Importer<'a, P> {
    #[must_use]
    pub fn new(store: &'a RecordStore<P>) -> Self {
        Self { store }
    }

    /// Replace the collection with the contents of a backup file.
    ///
    /// The backup is fully validated before anything is written.
    ///
    /// # Errors
    ///
    /// Returns a read or validation error (the document is untouched), or a
    /// save error.
    pub fn import(&self, path: &Path) -> Result<ImportStats> {
        let records = read_backup(path)?;

        let replacement = self.store.restore(records)?;
        let (replaced, restored) = (replacement.replaced, replacement.written);
        info!(path = %path.display(), replaced, restored, "Backup restored");

        Ok(ImportStats { replaced, restored })
    }
}
