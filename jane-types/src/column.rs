use std::fmt;

/// Logical type of a dataset column.
///
/// The type decides how values are ordered by the comparator shared between
/// index construction and sorting. Type names coming from a data adapter are
/// mapped case-insensitively; names the engine does not know are kept as
/// [`ColumnType::Other`] and order every value as equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// `number`, `integer`, `float`, `double`: compared numerically.
    Numeric,
    /// `string`: numeric-looking strings compare numerically, everything
    /// else compares case-insensitively with whitespace removed.
    Text,
    /// `datetime`, `timestamp`, `temporal`: compared by epoch value.
    Temporal,
    /// `boolean`, `bool`: `false` orders before `true`.
    Boolean,
    /// Any other declared type, e.g. an assembled `GeoPoint`.
    Other(String),
}

impl ColumnType {
    /// Canonical lowercase name of the type.
    pub fn name(&self) -> &str {
        match self {
            ColumnType::Numeric => "number",
            ColumnType::Text => "string",
            ColumnType::Temporal => "datetime",
            ColumnType::Boolean => "boolean",
            ColumnType::Other(name) => name,
        }
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Numeric)
    }
}

impl From<&str> for ColumnType {
    fn from(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "number" | "integer" | "float" | "double" => ColumnType::Numeric,
            "string" => ColumnType::Text,
            "datetime" | "timestamp" | "temporal" => ColumnType::Temporal,
            "boolean" | "bool" => ColumnType::Boolean,
            _ => ColumnType::Other(name.to_string()),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
