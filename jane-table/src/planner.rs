//! Query configuration and its compilation against a bag's metadata.
//!
//! Select and sort lists are accepted either as one delimited string
//! (`"[Full Name], age desc"`) or as explicit name lists. Column names are
//! resolved case-insensitively; names the metadata does not know are skipped
//! with a warning rather than failing the query.

#![forbid(unsafe_code)]

use std::sync::Arc;

use jane_expr::FilterExpr;
use jane_transform::RecordTransform;

use crate::filter::RowFilter;
use crate::metadata::MetaData;

/// A select or sort list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnList {
    /// Comma-separated names, optionally `[bracket quoted]`.
    Delimited(String),
    /// One name per item, same syntax per item as [`ColumnList::Delimited`].
    Names(Vec<String>),
}

impl ColumnList {
    /// Raw, uncleaned items.
    pub fn items(&self) -> Vec<&str> {
        match self {
            ColumnList::Delimited(text) => text.split(',').collect(),
            ColumnList::Names(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for ColumnList {
    fn from(text: &str) -> Self {
        ColumnList::Delimited(text.to_string())
    }
}

impl From<String> for ColumnList {
    fn from(text: String) -> Self {
        ColumnList::Delimited(text)
    }
}

impl From<Vec<String>> for ColumnList {
    fn from(names: Vec<String>) -> Self {
        ColumnList::Names(names)
    }
}

impl From<Vec<&str>> for ColumnList {
    fn from(names: Vec<&str>) -> Self {
        ColumnList::Names(names.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ColumnList {
    fn from(names: [&str; N]) -> Self {
        ColumnList::Names(names.iter().map(|s| s.to_string()).collect())
    }
}

/// The `where` part of a query.
#[derive(Clone, Debug)]
pub enum WhereClause {
    /// Query-language text. No text syntax is supported; a text clause
    /// compiles to "no filter" and is reported.
    Text(String),
    Filter(Arc<dyn RowFilter>),
}

impl WhereClause {
    pub fn filter(filter: impl RowFilter + 'static) -> Self {
        WhereClause::Filter(Arc::new(filter))
    }
}

impl From<FilterExpr> for WhereClause {
    fn from(expr: FilterExpr) -> Self {
        WhereClause::filter(expr)
    }
}

impl From<&str> for WhereClause {
    fn from(text: &str) -> Self {
        WhereClause::Text(text.to_string())
    }
}

/// One compiled sort key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub ascending: bool,
}

/// Select / where / sort / transform settings of a query.
#[derive(Clone, Debug, Default)]
pub struct QueryConfig {
    pub select: Option<ColumnList>,
    pub filter: Option<WhereClause>,
    pub sort: Option<ColumnList>,
    pub transform: Option<Arc<dyn RecordTransform>>,
}

impl QueryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_select(mut self, select: impl Into<ColumnList>) -> Self {
        self.select = Some(select.into());
        self
    }

    pub fn with_where(mut self, filter: impl Into<WhereClause>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<ColumnList>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_transform(mut self, transform: impl RecordTransform + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn with_shared_transform(mut self, transform: Arc<dyn RecordTransform>) -> Self {
        self.transform = Some(transform);
        self
    }

    /// True when no part of the query is configured.
    pub fn is_empty(&self) -> bool {
        self.select.is_none()
            && self.filter.is_none()
            && self.sort.is_none()
            && self.transform.is_none()
    }
}

/// Strip surrounding whitespace and one pair of `[` `]` quotes.
pub fn clean_column_name(item: &str) -> &str {
    let name = item.trim();
    let name = name.strip_prefix('[').unwrap_or(name).trim_start();
    name.strip_suffix(']').unwrap_or(name).trim_end()
}

/// Split a trailing `asc`/`desc` token (any case) off a sort item.
///
/// The token must be separated from the name by whitespace or a closing
/// bracket; a column literally named `desc` stays a column.
pub fn split_sort_direction(item: &str) -> (&str, bool) {
    let trimmed = item.trim();
    let lower = trimmed.to_ascii_lowercase();
    for (token, ascending) in [("desc", false), ("asc", true)] {
        if lower.ends_with(token) {
            let head = &trimmed[..trimmed.len() - token.len()];
            if head.ends_with(char::is_whitespace) || head.ends_with(']') {
                return (clean_column_name(head), ascending);
            }
        }
    }
    (clean_column_name(trimmed), true)
}

/// Compile a select list into declared column names.
///
/// The primary key, when the metadata declares one, always comes first and
/// appears once. Returns `None` when there is no select list or nothing in it
/// (primary key included) resolved, meaning "every column".
pub fn compile_select(select: Option<&ColumnList>, metadata: &MetaData) -> Option<Vec<String>> {
    let select = select?;
    let mut columns: Vec<String> = metadata
        .primary_key()
        .map(|pk| vec![pk.to_string()])
        .unwrap_or_default();

    for item in select.items() {
        let name = clean_column_name(item);
        if name.is_empty() {
            continue;
        }
        match metadata.mapped_column(name) {
            Some(meta) if columns.contains(&meta.name) => {
                tracing::debug!(
                    "[SELECT] Skipping column ({}) - already selected or the PK is automatically included",
                    name
                );
            }
            Some(meta) => columns.push(meta.name.clone()),
            None => tracing::warn!("[SELECT] Skipping invalid column ({})", name),
        }
    }

    if columns.is_empty() {
        None
    } else {
        Some(columns)
    }
}

/// Compile a where clause into a usable filter.
pub fn compile_where(filter: Option<&WhereClause>) -> Option<&dyn RowFilter> {
    match filter? {
        WhereClause::Filter(f) => Some(f.as_ref()),
        WhereClause::Text(text) => {
            tracing::warn!(
                "[WHERE] Ignoring text clause ({}) - only typed filters are supported",
                text
            );
            None
        }
    }
}

/// Compile a sort list into ordered keys. Unknown columns are skipped;
/// returns `None` when nothing resolved.
pub fn compile_sort(sort: Option<&ColumnList>, metadata: &MetaData) -> Option<Vec<SortKey>> {
    let sort = sort?;
    let mut keys: Vec<SortKey> = Vec::new();
    for item in sort.items() {
        if item.trim().is_empty() {
            continue;
        }
        let (name, ascending) = split_sort_direction(item);
        match metadata.mapped_column(name) {
            Some(meta) => keys.push(SortKey {
                column: meta.name.clone(),
                ascending,
            }),
            None => tracing::warn!("[SORT] Skipping invalid column ({})", name),
        }
    }

    if keys.is_empty() { None } else { Some(keys) }
}
