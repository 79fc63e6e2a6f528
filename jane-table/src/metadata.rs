//! Per-dataset column registry.
//!
//! [`MetaData`] records each column's declared type and tags, resolves column
//! names case-insensitively and keeps a reverse index from tag to the columns
//! carrying it. The reserved [`PRIMARY_KEY_TAG`] marks the primary-key column.

#![forbid(unsafe_code)]

use indexmap::IndexMap;
use jane_result::{Error, Result as JaneResult};
use jane_types::ColumnType;
use jane_types::constants::PRIMARY_KEY_TAG;
use rustc_hash::FxHashMap;

/// Declared shape of one column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub column_type: ColumnType,
    pub tags: Vec<String>,
}

impl ColumnMeta {
    #[inline]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    #[inline]
    pub fn is_primary_key(&self) -> bool {
        self.has_tag(PRIMARY_KEY_TAG)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MetaData {
    columns: IndexMap<String, ColumnMeta>,
    /// Lowercase name -> declared name.
    aliases: FxHashMap<String, String>,
    /// Tag -> columns carrying it, in declaration order.
    tags: FxHashMap<String, Vec<String>>,
}

impl MetaData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a column.
    ///
    /// Duplicate tags on the same column are collapsed. Fails when the name
    /// is already declared, or when the column carries the primary-key tag
    /// and another column already does; in both cases nothing is recorded.
    pub fn add_column<T, I, S>(&mut self, name: &str, column_type: T, tags: I) -> JaneResult<()>
    where
        T: Into<ColumnType>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.columns.contains_key(name) {
            return Err(Error::DuplicateColumn(name.to_string()));
        }

        let mut column_tags: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.into();
            if !column_tags.contains(&tag) {
                column_tags.push(tag);
            }
        }

        if column_tags.iter().any(|t| t == PRIMARY_KEY_TAG)
            && let Some(existing) = self.primary_key()
        {
            return Err(Error::DuplicatePrimaryKey {
                existing: existing.to_string(),
                rejected: name.to_string(),
            });
        }

        let column_type = column_type.into();
        tracing::trace!("[METADATA] adding column [{}] as {}", name, column_type);

        for tag in &column_tags {
            self.tags
                .entry(tag.clone())
                .or_default()
                .push(name.to_string());
        }
        self.aliases.insert(name.to_lowercase(), name.to_string());
        self.columns.insert(
            name.to_string(),
            ColumnMeta {
                name: name.to_string(),
                column_type,
                tags: column_tags,
            },
        );
        Ok(())
    }

    /// Builder form of [`MetaData::add_column`].
    pub fn with_column<T, I, S>(mut self, name: &str, column_type: T, tags: I) -> JaneResult<Self>
    where
        T: Into<ColumnType>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_column(name, column_type, tags)?;
        Ok(self)
    }

    /// Exact-name lookup.
    #[inline]
    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.get(name)
    }

    /// Case-insensitive lookup.
    pub fn mapped_column(&self, name: &str) -> Option<&ColumnMeta> {
        self.aliases
            .get(&name.to_lowercase())
            .and_then(|declared| self.columns.get(declared))
    }

    /// Columns carrying `tag`, in declaration order.
    pub fn columns_by_tag(&self, tag: &str) -> Option<&[String]> {
        self.tags.get(tag).map(Vec::as_slice)
    }

    /// Name of the first column tagged as primary key.
    pub fn primary_key(&self) -> Option<&str> {
        self.columns_by_tag(PRIMARY_KEY_TAG)
            .and_then(|cols| cols.first())
            .map(String::as_str)
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnMeta> {
        self.columns.values()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Metadata restricted to `names`, in that order. Every name must be a
    /// declared column.
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> JaneResult<MetaData> {
        let mut projected = MetaData::new();
        for name in names {
            let name = name.as_ref();
            let meta = self
                .column(name)
                .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;
            projected.add_column(&meta.name, meta.column_type.clone(), meta.tags.iter().cloned())?;
        }
        Ok(projected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> MetaData {
        MetaData::new()
            .with_column("Id", "integer", [PRIMARY_KEY_TAG, "key"])
            .and_then(|m| m.with_column("Name", "string", ["label", "key"]))
            .and_then(|m| m.with_column("Born", "datetime", Vec::<String>::new()))
            .expect("metadata")
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let md = people();
        assert_eq!(md.mapped_column("name").map(|c| c.name.as_str()), Some("Name"));
        assert_eq!(md.mapped_column("BORN").map(|c| &c.column_type), Some(&ColumnType::Temporal));
        assert!(md.column("name").is_none());
        assert!(md.mapped_column("age").is_none());
    }

    #[test]
    fn tags_reverse_index_in_declaration_order() {
        let md = people();
        assert_eq!(md.columns_by_tag("key"), Some(&["Id".to_string(), "Name".to_string()][..]));
        assert_eq!(md.columns_by_tag("missing"), None);
        assert_eq!(md.primary_key(), Some("Id"));
        assert!(md.column("Id").unwrap().is_primary_key());
    }

    #[test]
    fn second_primary_key_is_rejected() {
        let mut md = people();
        let err = md.add_column("Uuid", "string", [PRIMARY_KEY_TAG]).unwrap_err();
        assert_eq!(
            err,
            Error::DuplicatePrimaryKey {
                existing: "Id".into(),
                rejected: "Uuid".into()
            }
        );
        assert!(!md.contains("Uuid"));
        assert_eq!(md.columns_by_tag(PRIMARY_KEY_TAG).map(<[String]>::len), Some(1));
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let mut md = people();
        assert_eq!(
            md.add_column("Name", "string", ["x"]),
            Err(Error::DuplicateColumn("Name".into()))
        );
        assert_eq!(md.columns_by_tag("x"), None);
    }

    #[test]
    fn project_keeps_requested_order() {
        let md = people();
        let projected = md.project(&["Name", "Id"]).unwrap();
        let names: Vec<_> = projected.columns().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Name", "Id"]);
        assert_eq!(projected.primary_key(), Some("Id"));
        assert!(matches!(md.project(&["Nope"]), Err(Error::ColumnNotFound(_))));
    }
}
