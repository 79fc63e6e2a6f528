//! Comparison kernels shared by index construction and sorting.
//!
//! Index building, index probing and the multi-key sort of a query must all
//! agree on one ordering per column type, otherwise a binary search over an
//! index would disagree with a sorted result. [`compare_values`] is that
//! single ordering.

#![forbid(unsafe_code)]

pub mod compare;
pub mod date;

pub use compare::{compare_values, numeric_string};
pub use date::{epoch_millis, parse_datetime};
