//! Row-position sets: the unit of intermediate filter results.

use croaring::Treemap;

/// Position of a record inside a bag's row sequence.
///
/// Positions are indices, not values; they are only meaningful for the bag
/// that produced them.
pub type RowPosition = u64;

/// Set of row positions produced by index queries and filter evaluation.
///
/// Iteration is always in ascending position order.
pub type RowSet = Treemap;

/// Build the set containing every position of a bag holding `len` rows.
pub fn full_row_set(len: usize) -> RowSet {
    Treemap::from_iter(0..len as RowPosition)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_set_covers_every_position() {
        let set = full_row_set(4);
        assert_eq!(set.cardinality(), 4);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert!(full_row_set(0).is_empty());
    }
}
