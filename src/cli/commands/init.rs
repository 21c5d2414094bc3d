//! Create the job document.
//!
//! The store treats a missing document as an empty collection, so `init` is
//! optional. It exists to pick the location up front and to reset a
//! document with `--force`.

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::config::open_store;
use crate::error::Result;

#[derive(Serialize)]
struct InitOutput {
    path: PathBuf,
    created: bool,
    replaced: usize,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `Error::AlreadyInitialized` if a document exists and `force` is
/// not set, or an error if the document cannot be written.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let store = open_store(db_path.map(PathBuf::as_path))?;
    let path = store.port().path().to_path_buf();

    let replaced = store.initialize(force)?;
    info!(path = %path.display(), force, replaced, "Document initialized");

    if json {
        let output = InitOutput {
            path,
            created: true,
            replaced,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if !crate::is_silent() {
        println!("Initialized job document at {}", path.display());
    }

    Ok(())
}
