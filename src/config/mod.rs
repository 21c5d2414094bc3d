//! Configuration management.
//!
//! This module resolves where the job document and backups live.
//!
//! # Layout
//!
//! - **Document**: `~/.printlog/data/jobs.json` (one JSON document for all jobs)
//! - **Lock file**: `~/.printlog/data/jobs.json.lock`, next to the document
//! - **Backups**: `~/.printlog/backups/printlog-<timestamp>.<ext>`

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::storage::{FileDocument, FileStore};

/// File name of the job document.
pub const DOCUMENT_FILE: &str = "jobs.json";

/// Get the global printlog directory location (`~/.printlog/`).
#[must_use]
pub fn global_printlog_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".printlog"))
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `PRINTLOG_TEST_DATA=1` (or any non-empty
/// value other than `0`/`false`). It redirects the document to an isolated
/// location.
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var("PRINTLOG_TEST_DATA").is_ok_and(|v| is_truthy(&v))
}

fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}

/// Get the test document path (`~/.printlog/test/jobs.json`).
#[must_use]
pub fn test_data_path() -> Option<PathBuf> {
    global_printlog_dir().map(|dir| dir.join("test").join(DOCUMENT_FILE))
}

/// Resolve the job document path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `PRINTLOG_TEST_DATA` environment variable → test document
/// 3. `PRINTLOG_DATA` environment variable
/// 4. Global location: `~/.printlog/data/jobs.json`
///
/// Returns `None` if no home directory can be determined.
#[must_use]
pub fn resolve_data_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if is_test_mode() {
        return test_data_path();
    }

    if let Ok(path) = std::env::var("PRINTLOG_DATA") {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    global_printlog_dir().map(|dir| dir.join("data").join(DOCUMENT_FILE))
}

/// Resolve the backup directory.
///
/// Priority: explicit path, `PRINTLOG_BACKUP_DIR`, `~/.printlog/backups`.
#[must_use]
pub fn resolve_backup_dir(explicit_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = explicit_dir {
        return Some(dir.to_path_buf());
    }

    if let Ok(dir) = std::env::var("PRINTLOG_BACKUP_DIR") {
        if !dir.trim().is_empty() {
            return Some(PathBuf::from(dir));
        }
    }

    global_printlog_dir().map(|dir| dir.join("backups"))
}

/// Default backup file name for an export taken at `at`.
#[must_use]
pub fn backup_file_name(at: DateTime<Utc>, extension: &str) -> String {
    format!("printlog-{}.{extension}", at.format("%Y%m%dT%H%M%SZ"))
}

/// Open the file-backed store for the resolved document path.
///
/// # Errors
///
/// Returns `Error::Config` if no document location can be determined.
pub fn open_store(explicit_path: Option<&Path>) -> Result<FileStore> {
    let path = resolve_data_path(explicit_path).ok_or_else(|| {
        Error::Config("cannot determine a home directory; pass --data <path>".to_string())
    })?;
    Ok(FileStore::new(FileDocument::new(path)))
}
