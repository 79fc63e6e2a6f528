//! Immutable dataset snapshots.
//!
//! A [`Bag`] is a namespace, its [`MetaData`] and an ordered list of records.
//! Once built it never changes: [`Bag::query`] always produces a fresh bag,
//! so any number of readers can share one behind an `Arc`. The only interior
//! state is the per-column index cache, filled lazily on first use.

#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::sync::{Arc, RwLock};

use jane_compute::compare_values;
use jane_result::{Error, Result as JaneResult};
use jane_types::{Record, RowPosition, RowSet, full_row_set};
use rustc_hash::FxHashMap;

use crate::index::ColumnIndex;
use crate::metadata::MetaData;
use crate::planner::{QueryConfig, SortKey, compile_select, compile_sort, compile_where};

#[derive(Debug)]
pub struct Bag {
    namespace: String,
    metadata: Arc<MetaData>,
    records: Vec<Record>,
    writable: bool,
    /// Declared column name -> sorted index.
    indexes: RwLock<FxHashMap<String, Arc<ColumnIndex>>>,
}

impl Bag {
    pub fn new(
        namespace: impl Into<String>,
        metadata: impl Into<Arc<MetaData>>,
        records: Vec<Record>,
        writable: bool,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            metadata: metadata.into(),
            records,
            writable,
            indexes: RwLock::new(FxHashMap::default()),
        }
    }

    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[inline]
    pub fn metadata(&self) -> &Arc<MetaData> {
        &self.metadata
    }

    #[inline]
    pub fn primary_key(&self) -> Option<&str> {
        self.metadata.primary_key()
    }

    #[inline]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, position: RowPosition) -> Option<&Record> {
        usize::try_from(position)
            .ok()
            .and_then(|pos| self.records.get(pos))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether consumers of this bag were promised private, mutable records.
    #[inline]
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Every row position of this bag.
    pub fn all_rows(&self) -> RowSet {
        full_row_set(self.records.len())
    }

    /// Columns that currently have a cached index.
    pub fn indexed_columns(&self) -> Vec<String> {
        match self.indexes.read() {
            Ok(cache) => {
                let mut names: Vec<String> = cache.keys().cloned().collect();
                names.sort();
                names
            }
            Err(_) => Vec::new(),
        }
    }

    /// Sorted index for `column`, built on first request and cached.
    ///
    /// The name is resolved exactly first, then case-insensitively.
    pub fn index(&self, column: &str) -> JaneResult<Arc<ColumnIndex>> {
        let meta = self
            .metadata
            .column(column)
            .or_else(|| self.metadata.mapped_column(column))
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))?;

        {
            let cache = self
                .indexes
                .read()
                .map_err(|_| Error::Internal("Failed to acquire index cache read lock".into()))?;
            if let Some(index) = cache.get(&meta.name) {
                return Ok(Arc::clone(index));
            }
        }

        let mut cache = self
            .indexes
            .write()
            .map_err(|_| Error::Internal("Failed to acquire index cache write lock".into()))?;
        let index = cache.entry(meta.name.clone()).or_insert_with(|| {
            tracing::debug!(
                "[INDEX] building index on {}.{} over {} rows",
                self.namespace,
                meta.name,
                self.records.len()
            );
            Arc::new(ColumnIndex::build(meta, &self.records))
        });
        Ok(Arc::clone(index))
    }

    /// Run `config` over this bag and return the result as a new bag.
    ///
    /// Unknown select and sort columns are skipped. Rows keep their original
    /// relative order unless a sort is configured; the sort is stable. With
    /// `writable`, every returned record owns its field storage.
    pub fn query(&self, config: &QueryConfig, writable: bool) -> JaneResult<Bag> {
        let selected = compile_select(config.select.as_ref(), &self.metadata);
        let metadata = match &selected {
            Some(columns) => Arc::new(self.metadata.project(columns)?),
            None => Arc::clone(&self.metadata),
        };
        let filter = compile_where(config.filter.as_ref());
        let sort_keys = compile_sort(config.sort.as_ref(), &metadata);

        let mut rows = self.all_rows();
        if let Some(filter) = filter {
            rows = filter.evaluate(self, &rows)?;
        }

        // Treemap iteration is ascending, which gives the baseline order.
        let mut records: Vec<Record> = Vec::with_capacity(rows.cardinality() as usize);
        for position in rows.iter() {
            let Some(record) = self.record(position) else {
                tracing::warn!(
                    "[QUERY] Skipping row position {} outside of {} ({} rows)",
                    position,
                    self.namespace,
                    self.records.len()
                );
                continue;
            };
            let record = match &selected {
                Some(columns) => record.project(columns),
                None if writable => record.detached(),
                None => record.clone(),
            };
            records.push(record);
        }

        if let Some(transform) = &config.transform {
            tracing::trace!(
                "[QUERY] applying transform {} to {} records",
                transform.name(),
                records.len()
            );
            records = records
                .into_iter()
                .map(|record| transform.handle_record(record, writable))
                .collect();
        }

        if let Some(keys) = &sort_keys {
            sort_records(&mut records, keys, &metadata);
        }

        Ok(Bag::new(self.namespace.clone(), metadata, records, writable))
    }
}

/// Stable multi-key sort; the first key that does not compare equal decides.
fn sort_records(records: &mut [Record], keys: &[SortKey], metadata: &MetaData) {
    let typed: Vec<_> = keys
        .iter()
        .filter_map(|key| {
            metadata
                .column(&key.column)
                .map(|meta| (key, &meta.column_type))
        })
        .collect();

    records.sort_by(|a, b| {
        typed
            .iter()
            .map(|(key, column_type)| {
                compare_values(
                    a.value_or_null(&key.column),
                    b.value_or_null(&key.column),
                    column_type,
                    key.ascending,
                )
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}
