#![forbid(unsafe_code)]

/// Reserved tag marking the primary-key column of a dataset.
pub const PRIMARY_KEY_TAG: &str = "PK";

/// Name of the synthetic root node of a reference registry.
pub const ROOT_NODE_NAME: &str = "Jane";
