//! Subscription contracts.
//!
//! A contract names the fields a subscriber intends to mutate. Two
//! subscriptions to one reference may never claim the same field; an empty
//! contract claims nothing and is read-only.

use rustc_hash::FxHashSet;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Contract {
    fields: FxHashSet<String>,
}

impl Contract {
    pub fn read_only() -> Self {
        Self::default()
    }

    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        fields.into_iter().collect()
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.fields.is_empty()
    }

    #[inline]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Fields claimed by both contracts, sorted.
    pub fn overlap(&self, other: &Contract) -> Vec<String> {
        let mut shared: Vec<String> = self.fields.intersection(&other.fields).cloned().collect();
        shared.sort();
        shared
    }
}

impl<S: Into<String>> FromIterator<S> for Contract {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_sorted_and_symmetric() {
        let a = Contract::new(["z", "color", "size"]);
        let b = Contract::new(["size", "z"]);
        assert_eq!(a.overlap(&b), vec!["size".to_string(), "z".to_string()]);
        assert_eq!(b.overlap(&a), a.overlap(&b));
        assert!(a.overlap(&Contract::read_only()).is_empty());
        assert!(Contract::new(Vec::<String>::new()).is_read_only());
    }
}
