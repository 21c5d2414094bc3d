//! Content hashing for the job document.
//!
//! The document envelope carries a SHA256 of its records so a truncated or
//! hand-edited file is detected on load instead of being half-read.

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::model::Record;

/// Compute the SHA256 of the compact JSON form of `records`.
///
/// The compact serialization is deterministic for a given ordered
/// collection, so the same records always hash the same way regardless of
/// how the surrounding document was pretty-printed.
///
/// # Errors
///
/// Returns an error if the records cannot be serialized.
pub fn records_checksum(records: &[Record]) -> Result<String> {
    let json = serde_json::to_vec(records)?;
    let mut hasher = Sha256::new();
    hasher.update(&json);
    Ok(format!("{:x}", hasher.finalize()))
}
