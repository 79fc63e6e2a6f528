//! Per-record transform pipeline.
//!
//! A transform maps one record to another. Bags run the configured transform
//! over every record they materialize, after projection and before sorting.
//!
//! The `writable` hint passed to [`RecordTransform::handle_record`] says
//! whether the caller will hand the result to a consumer allowed to mutate
//! it. Transforms honour it by returning a record with private field
//! storage ([`Record::detached`](jane_types::Record::detached)); without it they
//! may return storage shared with the input.

#![forbid(unsafe_code)]

use std::fmt;

use jane_types::Record;

pub mod step;

pub use step::{AssembleMapping, TransformStep};

/// Capability of any transform plugin.
pub trait RecordTransform: fmt::Debug {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    fn handle_record(&self, record: Record, writable: bool) -> Record;
}
