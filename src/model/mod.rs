//! Data models for printlog.
//!
//! A print job is an open-ended mapping of fields. The only fields the
//! store manages itself are `id` and `timestamp`; everything else
//! (material, printer, photo references, ...) is caller-defined.

pub mod record;

pub use record::{
    format_timestamp, generate_id, parse_timestamp, Collection, Fields, Record, ID_FIELD,
    TIMESTAMP_FIELD,
};
