//! Status command implementation.
//!
//! Reports where the document lives and whether it can be trusted. A
//! corrupt document is a status to report, not an error, so this command
//! only fails on I/O.

use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;

use crate::config::open_store;
use crate::error::Result;
use crate::model::parse_timestamp;
use crate::storage::{decode, inspect, ChecksumState, DocumentInfo, DocumentPort};

#[derive(Serialize)]
struct StatusOutput {
    path: PathBuf,
    exists: bool,
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<DocumentInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    newest: Option<String>,
}

/// Execute the status command.
///
/// # Errors
///
/// Returns an error if the document exists but cannot be read.
pub fn execute(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let store = open_store(db_path.map(PathBuf::as_path))?;
    let port = store.port();
    let bytes = {
        let _lock = port.lock_shared()?;
        port.load()?
    };

    let (document, error) = match inspect(&bytes) {
        Ok(info) => (Some(info), None),
        Err(e) => (None, Some(e.to_string())),
    };

    // Only trust timestamps from a document that decodes cleanly.
    let newest = decode(&bytes).ok().and_then(|records| {
        records
            .iter()
            .filter_map(|r| r.timestamp())
            .filter_map(|raw| parse_timestamp(raw).map(|at| (at, raw.to_string())))
            .max_by_key(|(at, _)| *at)
            .map(|(_, raw)| raw)
    });

    let output = StatusOutput {
        path: port.path().to_path_buf(),
        exists: port.exists(),
        size: port.size(),
        document,
        error,
        newest,
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("{}", "printlog status".bold());
    println!("  Document: {}", output.path.display());
    if !output.exists {
        println!("  State:    {}", "not created yet (reads as empty)".dimmed());
        return Ok(());
    }
    println!("  Size:     {} bytes", output.size);

    if let Some(err) = &output.error {
        println!("  State:    {} {err}", "unreadable".red().bold());
        return Ok(());
    }

    if let Some(info) = &output.document {
        let layout = match info.version {
            Some(version) => format!("{:?} v{version}", info.layout),
            None => format!("{:?}", info.layout),
        };
        println!("  Layout:   {}", layout.to_lowercase());
        println!("  Jobs:     {}", info.records);
        let checksum = match &info.checksum {
            ChecksumState::Verified => "verified".green().to_string(),
            ChecksumState::Absent => "none".dimmed().to_string(),
            ChecksumState::Mismatch { stored, computed } => format!(
                "{} (stored {stored}, computed {computed})",
                "MISMATCH".red().bold()
            ),
        };
        println!("  Checksum: {checksum}");
    }

    if let Some(newest) = &output.newest {
        println!("  Newest:   {newest}");
    }

    Ok(())
}
