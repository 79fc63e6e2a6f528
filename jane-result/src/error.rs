use std::fmt;

use thiserror::Error;

/// Unified error type for all Jane operations.
///
/// `Error` implements `Send` and `Sync`, so a failure raised while querying a
/// shared [`Bag`](https://docs.rs/jane-table) can be handed to any thread.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A column was referenced that the dataset's metadata does not declare.
    ///
    /// Raised when building an index or evaluating a filter leaf over an
    /// unknown column. Select and sort lists never raise this; they skip
    /// unknown names instead.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// A column name was declared twice in the same metadata.
    #[error("column '{0}' is already declared")]
    DuplicateColumn(String),

    /// A second column was tagged as the primary key.
    ///
    /// Metadata allows at most one primary-key column; the first declaration
    /// wins and the rejected column is not added.
    #[error("primary key already declared on '{existing}', cannot tag '{rejected}'")]
    DuplicatePrimaryKey { existing: String, rejected: String },

    /// Invalid user input or API parameter.
    ///
    /// The message describes what was invalid, e.g. an unknown comparison
    /// operator token.
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Internal error indicating a bug or unexpected state, such as a lock
    /// poisoned by a panicking thread.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid argument error from any displayable value.
    ///
    /// # Examples
    ///
    /// ```
    /// use jane_result::Error;
    ///
    /// fn parse_limit(input: &str) -> Result<u32, Error> {
    ///     input.parse::<u32>().map_err(Error::invalid_argument)
    /// }
    ///
    /// assert_eq!(parse_limit("42").unwrap(), 42);
    /// assert!(matches!(parse_limit("abc"), Err(Error::InvalidArgumentError(_))));
    /// ```
    #[inline]
    pub fn invalid_argument<E: fmt::Display>(err: E) -> Self {
        Error::InvalidArgumentError(err.to_string())
    }

    /// Create an internal error from any displayable value.
    #[inline]
    pub fn internal<E: fmt::Display>(err: E) -> Self {
        Error::Internal(err.to_string())
    }
}
