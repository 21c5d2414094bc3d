//! Storage layer for printlog.
//!
//! This module provides persistence for the job collection:
//! - A single JSON document as the source of truth
//! - Atomic whole-document replacement
//! - Serialized load-modify-save mutations
//! - Versioned, checksummed document envelope
//!
//! # Submodules
//!
//! - [`codec`] - Document encode/decode
//! - [`hash`] - Record checksums
//! - [`port`] - Persistence port (filesystem, memory)
//! - [`store`] - Record store (CRUD, clear, restore)

pub mod codec;
pub mod hash;
pub mod port;
pub mod store;

pub use codec::{
    decode, encode, inspect, ChecksumState, DocumentInfo, Layout, FORMAT_NAME, FORMAT_VERSION,
};
pub use port::{atomic_write, DocumentPort, FileDocument, MemoryDocument, PortLock};
pub use store::{ChangeKind, MutationContext, RecordStore, Replacement};

/// Store over the on-disk job document.
pub type FileStore = RecordStore<FileDocument>;
