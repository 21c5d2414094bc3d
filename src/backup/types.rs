//! Backup types.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;

/// File format of a backup.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupFormat {
    /// JSON array of records (restorable)
    #[default]
    Json,
    /// Comma-separated values, one column per field (export only)
    Csv,
}

impl BackupFormat {
    /// File extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

/// Statistics for an export operation.
#[derive(Debug, Clone, Serialize)]
pub struct ExportStats {
    /// Number of records written.
    pub records: usize,
    /// Number of distinct field names across all records.
    pub fields: usize,
    /// Size of the backup in bytes.
    pub bytes: usize,
    /// Where the backup was written.
    pub path: PathBuf,
    pub format: BackupFormat,
}

impl ExportStats {
    /// Returns true if the backup holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records == 0
    }
}

/// Statistics for an import operation.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportStats {
    /// Number of records in the collection before the restore (0 if the
    /// previous document was unreadable).
    pub replaced: usize,
    /// Number of records restored.
    pub restored: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_format_default() {
        assert_eq!(BackupFormat::default(), BackupFormat::Json);
        assert_eq!(BackupFormat::Csv.extension(), "csv");
    }

    #[test]
    fn test_export_stats_empty() {
        let stats = ExportStats {
            records: 0,
            fields: 0,
            bytes: 3,
            path: PathBuf::from("backup.json"),
            format: BackupFormat::Json,
        };
        assert!(stats.is_empty());
    }
}
