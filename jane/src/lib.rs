//! Jane: lazily populated, shareable client-side datasets.
//!
//! This crate is the entrypoint for the Jane toolkit. It re-exports the
//! public API of the underlying `jane-*` crates.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use jane::{
//!     Bag, FilterExpr, MetaData, QueryConfig, Record, Reference, ReferenceLink,
//!     ReferenceOptions, Registry, StaticSource, PRIMARY_KEY_TAG,
//! };
//!
//! let metadata = MetaData::new()
//!     .with_column("id", "number", [PRIMARY_KEY_TAG])
//!     .and_then(|m| m.with_column("age", "number", [] as [&str; 0]))
//!     .unwrap();
//! let rows = vec![
//!     Record::from_iter([("id", 1), ("age", 30)]),
//!     Record::from_iter([("id", 2), ("age", 20)]),
//! ];
//! let bag = Arc::new(Bag::new("people", metadata, rows, false));
//!
//! let registry = Registry::new();
//! let people = Reference::new("people", StaticSource::new(bag));
//! let adults = ReferenceLink::create(
//!     "adults",
//!     &people,
//!     QueryConfig::new().with_where(FilterExpr::gt_eq("age", 25)),
//!     ReferenceOptions::default(),
//! );
//! registry.add_data_reference(&people);
//! registry.add_data_reference(&adults);
//!
//! adults.populate().unwrap();
//! assert_eq!(adults.bag().unwrap().len(), 1);
//! ```
//!
//! # Architecture
//!
//! - **Values** (`jane-types`, `jane-compute`): records, column types and the
//!   type-aware comparator.
//! - **Expressions** (`jane-expr`, `jane-transform`): filter trees and record
//!   transforms.
//! - **Datasets** (`jane-table`): metadata, bags, sorted indexes and query
//!   compilation.
//! - **Runtime** (`jane-runtime`): references, links, subscription contracts
//!   and the registry.

pub use jane_compute::compare_values;
pub use jane_expr::{CompareOp, FilterExpr};
pub use jane_result::{Error, Result};
pub use jane_runtime::{
    Acquire, Contract, DataEvent, DeferredSource, EventKind, EventSource, EventSubscriber,
    FnSubscriber, PopulateTicket, Reference, ReferenceLink, ReferenceOptions, ReferenceStatus,
    Registry, RegistryOptions, StaticSource, SubscriberId,
};
pub use jane_table::{
    Bag, ColumnIndex, ColumnList, ColumnMeta, MetaData, QueryConfig, RowFilter, SortKey,
    WhereClause,
};
pub use jane_transform::{AssembleMapping, RecordTransform, TransformStep};
pub use jane_types::constants::{PRIMARY_KEY_TAG, ROOT_NODE_NAME};
pub use jane_types::{ColumnType, Record, RowPosition, RowSet, Value};
