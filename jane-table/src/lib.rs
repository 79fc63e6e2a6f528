//! Datasets for Jane.
//!
//! - [`metadata`]: column declarations, tags and the primary key.
//! - [`index`]: sorted per-column indexes answering relational predicates.
//! - [`filter`]: the [`RowFilter`] capability and its evaluation for
//!   [`FilterExpr`](jane_expr::FilterExpr) trees.
//! - [`planner`]: query configuration and its compilation.
//! - [`bag`]: immutable snapshots and [`Bag::query`].

#![forbid(unsafe_code)]

pub mod bag;
pub mod filter;
pub mod index;
pub mod metadata;
pub mod planner;

pub use bag::Bag;
pub use filter::RowFilter;
pub use index::{ColumnIndex, IndexEntry};
pub use metadata::{ColumnMeta, MetaData};
pub use planner::{ColumnList, QueryConfig, SortKey, WhereClause};
