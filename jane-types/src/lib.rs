//! Types shared across Jane crates.
//!
//! These live in `jane-types` so that the comparator, expression, transform
//! and table crates can agree on one value model without depending on each
//! other.

#![forbid(unsafe_code)]

pub mod column;
pub mod constants;
pub mod record;
pub mod row_set;
pub mod value;

pub use column::ColumnType;
pub use record::{Fields, Record};
pub use row_set::{RowPosition, RowSet, full_row_set};
pub use value::Value;
