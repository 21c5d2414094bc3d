//! Backup export and restore.
//!
//! - **Export**: current collection → backup file (JSON array or CSV)
//! - **Import**: backup file → validated collection → `replace_all`
//!
//! # File Format
//!
//! JSON backups are the bare array layout, one object per job, so they can
//! be read by anything that understands JSON:
//!
//! ```json
//! [
//!   {"id": "job_1a2b3c4d5e6f", "timestamp": "2025-01-20T10:00:00.000Z", "material": "PLA"}
//! ]
//! ```
//!
//! Import also accepts a copy of the live document (the checksummed envelope).
//! CSV is export-only.

mod csv;
mod export;
mod import;
mod types;

pub use csv::{collect_columns, render_csv, render_cell};
pub use export::Exporter;
pub use import::{read_backup, Importer};
pub use types::{BackupFormat, ExportStats, ImportStats};
