//! Backup export.
//!
//! Exports are snapshots: the file holds the collection as it was when the
//! export read it. Files are written atomically, so an interrupted export
//! never leaves a half-written backup behind under the final name.

use std::path::Path;

use tracing::info;

use crate::backup::csv::{collect_columns, render_csv};
use crate::backup::types::{BackupFormat, ExportStats};
use crate::error::Result;
use crate::storage::{atomic_write, DocumentPort, RecordStore};

/// Exporter for backup files.
pub struct Exporter<'a, P: DocumentPort> {
    store: &'a RecordStore<P>,
}

impl<'a, P: DocumentPort> Exporter<'a, P> {
    #[must_use]
    pub fn new(store: &'a RecordStore<P>) -> Self {
        Self { store }
    }

    /// Render the current collection in `format`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or decoded.
    pub fn render(&self, format: BackupFormat) -> Result<(Vec<u8>, usize, usize)> {
        let records = self.store.list_all()?;
        let fields = collect_columns(&records).len();

        let bytes = match format {
            BackupFormat::Json => {
                let mut bytes = serde_json::to_vec_pretty(&records)?;
                bytes.push(b'\n');
                bytes
            }
            BackupFormat::Csv => render_csv(&records).into_bytes(),
        };

        Ok((bytes, records.len(), fields))
    }

    /// Write a backup of the current collection to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or the backup cannot
    /// be written.
    pub fn export(&self, path: &Path, format: BackupFormat) -> Result<ExportStats> {
        let (bytes, records, fields) = self.render(format)?;
        atomic_write(path, &bytes)?;

        info!(path = %path.display(), records, ?format, "Backup written");

        Ok(ExportStats {
            records,
            fields,
            bytes: bytes.len(),
            path: path.to_path_buf(),
            format,
        })
    }
}
