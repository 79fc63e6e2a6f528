//! Sorted per-column indexes.
//!
//! A [`ColumnIndex`] is the column's values paired with their row positions,
//! stable-sorted ascending with the shared comparator. Relational queries
//! become two binary searches plus a walk over one or two contiguous
//! segments of the sorted entries:
//!
//! ```text
//!   entries:  [ < value ... | = value ... | > value ... ]
//!             0             lo            hi           len
//! ```
//!
//! The index is built once from an immutable bag and never changes.

#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::ops::Range;

use jane_compute::compare_values;
use jane_expr::CompareOp;
use jane_types::{ColumnType, Record, RowPosition, RowSet, Value};

use crate::metadata::ColumnMeta;

/// One `(value, original row position)` pair.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexEntry {
    pub value: Value,
    pub position: RowPosition,
}

#[derive(Debug)]
pub struct ColumnIndex {
    column: String,
    column_type: ColumnType,
    entries: Vec<IndexEntry>,
}

impl ColumnIndex {
    /// Scan `records` and sort their values for `column`. Records lacking
    /// the field index it as null.
    pub fn build(column: &ColumnMeta, records: &[Record]) -> Self {
        let mut entries: Vec<IndexEntry> = records
            .iter()
            .enumerate()
            .map(|(position, record)| IndexEntry {
                value: record.value_or_null(&column.name).clone(),
                position: position as RowPosition,
            })
            .collect();

        let column_type = column.column_type.clone();
        entries.sort_by(|a, b| compare_values(&a.value, &b.value, &column_type, true));

        Self {
            column: column.name.clone(),
            column_type,
            entries,
        }
    }

    #[inline]
    pub fn column(&self) -> &str {
        &self.column
    }

    #[inline]
    pub fn column_type(&self) -> &ColumnType {
        &self.column_type
    }

    #[inline]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    fn cmp_slot(&self, slot: usize, value: &Value) -> Ordering {
        compare_values(&self.entries[slot].value, value, &self.column_type, true)
    }

    /// First slot whose value is not less than `value`.
    pub fn lower_bound(&self, value: &Value) -> usize {
        let (mut lo, mut hi) = (0, self.entries.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.cmp_slot(mid, value) == Ordering::Less {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// First slot at or after `from` whose value is not equal to `value`,
    /// i.e. the end of the run of equal values starting at `from`.
    pub fn upper_bound_from(&self, from: usize, value: &Value) -> usize {
        let (mut lo, mut hi) = (from, self.entries.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.cmp_slot(mid, value) == Ordering::Equal {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        hi
    }

    /// Sorted-slot range satisfying `column <op> value`.
    pub fn slot_range(&self, op: CompareOp, value: &Value) -> Range<usize> {
        let lo = self.lower_bound(value);
        let hi = self.upper_bound_from(lo, value);
        let count = self.entries.len();
        match op {
            CompareOp::Lt => 0..lo,
            CompareOp::LtEq => 0..hi,
            CompareOp::Eq => lo..hi,
            CompareOp::GtEq => lo..count,
            CompareOp::Gt => hi..count,
        }
    }

    /// Row positions satisfying `column <op> value` that are also in `input`.
    ///
    /// O(log n) to locate the segment plus O(k) to walk its k slots.
    pub fn query_operator(&self, op: CompareOp, value: &Value, input: &RowSet) -> RowSet {
        let mut out = RowSet::new();
        for entry in &self.entries[self.slot_range(op, value)] {
            if input.contains(entry.position) {
                out.add(entry.position);
            }
        }
        out
    }
}
