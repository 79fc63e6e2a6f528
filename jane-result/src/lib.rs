//! Error types and result definitions for the Jane dataset engine.
//!
//! Every `jane-*` crate reports failures through the single [`Error`] enum and
//! the [`Result<T>`] alias so that errors propagate across crate boundaries
//! with the `?` operator.
//!
//! # What is (and is not) an error
//!
//! Most data conditions inside the engine degrade gracefully and are only
//! logged: unknown column names in a select or sort list are skipped, a
//! missing extract key leaves the record untouched, a duplicate reference
//! name makes registration a no-op and a conflicting subscription contract is
//! refused with a `false`/`None` indicator. None of those produce an
//! [`Error`].
//!
//! [`Error`] is reserved for shape violations a caller has to fix:
//!
//! - **Lookup failures** ([`Error::ColumnNotFound`]): an index or filter names
//!   a column the dataset does not declare
//! - **Metadata violations** ([`Error::DuplicateColumn`],
//!   [`Error::DuplicatePrimaryKey`])
//! - **User input errors** ([`Error::InvalidArgumentError`])
//! - **Internal errors** ([`Error::Internal`]): bugs or poisoned state

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
