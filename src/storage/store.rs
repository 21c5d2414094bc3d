//! Record store.
//!
//! Owns CRUD semantics over the job document. The store keeps no cached
//! collection: every call re-reads the document through its
//! [`DocumentPort`], so the document is the single source of truth.
//!
//! Mutations follow the `mutate` protocol:
//! 1. Take the in-process write gate, then the port's exclusive lock
//! 2. Load and decode the current collection
//! 3. Run the mutation closure, which records its changes
//! 4. Encode and save (only if something changed)
//! 5. Release both locks
//!
//! A failed closure or a failed save leaves the document as it was.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{generate_id, Collection, Fields, Record};
use crate::storage::codec::{decode, encode};
use crate::storage::port::DocumentPort;
use crate::validate::{validate_collection, validate_restore_payload};

/// Kinds of change a mutation can make to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl ChangeKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

/// Context for a mutation operation, tracking which records it touched.
///
/// A mutation that records no change is not saved.
#[derive(Debug)]
pub struct MutationContext {
    /// Name of the operation being performed.
    pub op_name: &'static str,
    changes: Vec<(ChangeKind, String)>,
}

impl MutationContext {
    fn new(op_name: &'static str) -> Self {
        Self {
            op_name,
            changes: Vec::new(),
        }
    }

    /// Record a change for this operation.
    pub fn record_change(&mut self, kind: ChangeKind, id: &str) {
        self.changes.push((kind, id.to_string()));
    }

    #[must_use]
    pub fn changes(&self) -> &[(ChangeKind, String)] {
        &self.changes
    }
}

/// Outcome of replacing the whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replacement {
    /// Readable records in the document before it was replaced.
    pub replaced: usize,
    /// Records written.
    pub written: usize,
}

/// Store of print-job records backed by a single document.
#[derive(Debug)]
pub struct RecordStore<P: DocumentPort> {
    port: P,
    gate: RwLock<()>,
}

impl<P: DocumentPort> RecordStore<P> {
    #[must_use]
    pub fn new(port: P) -> Self {
        Self {
            port,
            gate: RwLock::new(()),
        }
    }

    #[must_use]
    pub fn port(&self) -> &P {
        &self.port
    }

    // ==================
    // Read Operations
    // ==================

    /// Return every record in document order.
    ///
    /// # Errors
    ///
    /// Returns `Error::Format` if the document is corrupt, `Error::Io` if it
    /// cannot be read.
    pub fn list_all(&self) -> Result<Collection> {
        let _gate = self.gate.read().unwrap_or_else(PoisonError::into_inner);
        let _lock = self.port.lock_shared()?;
        let bytes = self.port.load()?;
        decode(&bytes)
    }

    /// Return every record, or an empty collection if the document cannot be
    /// read or decoded.
    ///
    /// This hides data problems from the caller; the failure is only logged.
    /// Prefer [`list_all`](Self::list_all).
    #[must_use]
    pub fn list_all_or_empty(&self) -> Collection {
        self.list_all().unwrap_or_else(|e| {
            let location = self.port.location();
            warn!(%location, error = %e, "Unreadable document, reporting no records");
            Vec::new()
        })
    }

    /// Get a single record by ID.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no record has this ID, or a read error.
    pub fn get(&self, id: &str) -> Result<Record> {
        self.list_all()?
            .into_iter()
            .find(|r| r.id() == Some(id))
            .ok_or_else(|| Error::NotFound { id: id.to_string() })
    }

    // ==================
    // Mutations
    // ==================

    /// Execute a load-modify-save mutation under exclusive access.
    ///
    /// # Errors
    ///
    /// Returns the closure's error (nothing is saved), or a lock, decode,
    /// encode or save error.
    pub fn mutate<F, R>(&self, op: &'static str, f: F) -> Result<R>
    where
        F: FnOnce(&mut Collection, &mut MutationContext) -> Result<R>,
    {
        let _gate = self.gate.write().unwrap_or_else(PoisonError::into_inner);
        let _lock = self.port.lock_exclusive()?;

        let mut records = decode(&self.port.load()?)?;
        let mut ctx = MutationContext::new(op);

        let result = f(&mut records, &mut ctx)?;

        if ctx.changes().is_empty() {
            debug!(op = ctx.op_name, "Mutation made no changes, skipping save");
            return Ok(result);
        }

        self.port.save(&encode(&records)?)?;

        for (kind, id) in ctx.changes() {
            debug!(op = ctx.op_name, id = %id, change = kind.as_str(), "Record committed");
        }
        debug!(op = ctx.op_name, records = records.len(), "Mutation committed");

        Ok(result)
    }

    /// Replace the whole document without trusting its current content.
    ///
    /// Used by init, clear and restore, which must succeed even over a
    /// corrupt document. `check` runs under the exclusive lock before
    /// anything is written. Returns how many readable records were replaced.
    fn overwrite<F>(&self, op: &'static str, records: &[Record], check: F) -> Result<usize>
    where
        F: FnOnce(&P) -> Result<()>,
    {
        let bytes = encode(records)?;
        let _gate = self.gate.write().unwrap_or_else(PoisonError::into_inner);
        let _lock = self.port.lock_exclusive()?;

        check(&self.port)?;
        let replaced = match self.port.load().and_then(|current| decode(&current)) {
            Ok(current) => current.len(),
            Err(e) => {
                let location = self.port.location();
                warn!(op, %location, error = %e, "Replacing unreadable document");
                0
            }
        };

        self.port.save(&bytes)?;
        let location = self.port.location();
        info!(op, replaced, records = records.len(), %location, "Document replaced");
        Ok(replaced)
    }

    /// Create a new record from caller fields.
    ///
    /// Assigns a fresh unique `id` and the current `timestamp`; caller
    /// supplied values for either are discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or saved. Nothing is
    /// committed in that case.
    pub fn create(&self, fields: Fields) -> Result<Record> {
        self.mutate("create", |records, ctx| {
            let taken: HashSet<&str> = records.iter().filter_map(Record::id).collect();
            let mut id = generate_id();
            while taken.contains(id.as_str()) {
                id = generate_id();
            }

            ctx.record_change(ChangeKind::Created, &id);
            let record = Record::new(id, Utc::now(), fields);
            records.push(record.clone());
            Ok(record)
        })
    }

    /// Merge `fields` into an existing record and refresh its timestamp.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no record has this ID (the document is
    /// left untouched), or a read/save error.
    pub fn update(&self, id: &str, fields: Fields) -> Result<Record> {
        self.mutate("update", |records, ctx| {
            let record = records
                .iter_mut()
                .find(|r| r.id() == Some(id))
                .ok_or_else(|| Error::NotFound { id: id.to_string() })?;

            record.merge(fields);
            record.touch(Utc::now());
            ctx.record_change(ChangeKind::Updated, id);
            Ok(record.clone())
        })
    }

    /// Remove a record, returning it.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no record has this ID, or a read/save
    /// error.
    pub fn delete(&self, id: &str) -> Result<Record> {
        self.mutate("delete", |records, ctx| {
            let index = records
                .iter()
                .position(|r| r.id() == Some(id))
                .ok_or_else(|| Error::NotFound { id: id.to_string() })?;

            let removed = records.remove(index);
            ctx.record_change(ChangeKind::Deleted, id);
            Ok(removed)
        })
    }

    /// Write an empty document, refusing to replace an existing one unless
    /// `force` is set.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyInitialized` if a document exists and `force`
    /// is false, or a save error.
    pub fn initialize(&self, force: bool) -> Result<usize> {
        self.overwrite("init", &[], |port| {
            if port.exists() && !force {
                return Err(Error::AlreadyInitialized {
                    path: PathBuf::from(port.location()),
                });
            }
            Ok(())
        })
    }

    /// Persist an empty collection, whatever the current document holds.
    ///
    /// Returns how many records were removed (0 if the document was
    /// unreadable).
    ///
    /// # Errors
    ///
    /// Returns an error if the empty document cannot be saved.
    pub fn clear(&self) -> Result<usize> {
        self.overwrite("clear", &[], |_| Ok(()))
    }

    /// Restore from an untyped backup payload.
    ///
    /// The payload must be an array of objects with unique non-empty string
    /// ids. Records are written verbatim, keeping their own ids and
    /// timestamps.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a malformed payload (nothing is
    /// written), or a save error.
    pub fn replace_all(&self, payload: Value) -> Result<usize> {
        let records = validate_restore_payload(payload)?;
        self.restore(records).map(|r| r.written)
    }

    /// Restore from already-decoded records.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if ids are missing or duplicated, or a
    /// save error.
    pub fn replace_all_records(&self, records: Collection) -> Result<usize> {
        self.restore(records).map(|r| r.written)
    }

    /// Replace the collection, reporting both the old and the new size.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if ids are missing or duplicated, or a
    /// save error.
    pub fn restore(&self, records: Collection) -> Result<Replacement> {
        validate_collection(&records)?;
        let replaced = self.overwrite("replace_all", &records, |_| Ok(()))?;
        Ok(Replacement {
            replaced,
            written: records.len(),
        })
    }
}
