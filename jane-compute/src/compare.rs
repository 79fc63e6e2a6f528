use std::cmp::Ordering;

use jane_types::{ColumnType, Value};

use crate::date::epoch_millis;

/// Compare two values of a column of type `column_type`.
///
/// Nulls are never equal to a non-null value: they sort first when
/// `ascending` and last otherwise. Non-null values are ordered per type:
///
/// - [`ColumnType::Numeric`]: numerically. Values that do not coerce to a
///   number order after every number and lexically among themselves.
/// - [`ColumnType::Text`]: values that read as a number (see
///   [`numeric_string`]) order before every other value and numerically
///   among themselves; the rest compare as lowercase text with all
///   whitespace removed.
/// - [`ColumnType::Temporal`]: by epoch milliseconds. Unparseable values order
///   after every valid datetime and lexically among themselves.
/// - [`ColumnType::Boolean`]: `false` before `true`.
/// - [`ColumnType::Other`]: every pair is equal, so stable sorts keep their
///   input order.
pub fn compare_values(
    left: &Value,
    right: &Value,
    column_type: &ColumnType,
    ascending: bool,
) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => {
            return if ascending {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        (false, true) => {
            return if ascending {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
        (false, false) => {}
    }

    let ord = match column_type {
        ColumnType::Numeric => compare_numeric(left, right),
        ColumnType::Text => compare_text(left, right),
        ColumnType::Temporal => compare_coerced(epoch_millis(left), epoch_millis(right), left, right),
        ColumnType::Boolean => compare_coerced(as_bool(left), as_bool(right), left, right),
        ColumnType::Other(_) => Ordering::Equal,
    };

    if ascending { ord } else { ord.reverse() }
}

/// The finite number `text` reads as once surrounding whitespace is
/// trimmed. `"10"`, `"010"`, `"2.50"`, `"1e3"` and `" 7"` qualify; `""`,
/// `"1a"` and `"inf"` do not.
pub fn numeric_string(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn compare_numeric(left: &Value, right: &Value) -> Ordering {
    if let (Value::Integer(a), Value::Integer(b)) = (left, right) {
        return a.cmp(b);
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (a, b) => compare_coerced(a.map(OrdF64), b.map(OrdF64), left, right),
    }
}

fn compare_text(left: &Value, right: &Value) -> Ordering {
    let a = left.to_string();
    let b = right.to_string();
    compare_coerced(
        numeric_string(&a).map(OrdF64),
        numeric_string(&b).map(OrdF64),
        left,
        right,
    )
}

/// Order coerced keys, placing values that failed coercion after every
/// coerced value and comparing those leftovers as folded text.
fn compare_coerced<T: Ord>(a: Option<T>, b: Option<T>, left: &Value, right: &Value) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => folded(&left.to_string()).cmp(&folded(&right.to_string())),
    }
}

fn folded(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Integer(i) => Some(*i != 0),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

#[derive(Clone, Copy, PartialEq)]
struct OrdF64(f64);

impl Eq for OrdF64 {}

impl PartialOrd for OrdF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn cmp(a: impl Into<Value>, b: impl Into<Value>, ty: &str) -> Ordering {
        compare_values(&a.into(), &b.into(), &ColumnType::from(ty), true)
    }

    #[test]
    fn nulls_first_ascending_last_descending() {
        let ty = ColumnType::Numeric;
        assert_eq!(compare_values(&Value::Null, &Value::from(1), &ty, true), Ordering::Less);
        assert_eq!(compare_values(&Value::Null, &Value::from(1), &ty, false), Ordering::Greater);
        assert_eq!(compare_values(&Value::from(1), &Value::Null, &ty, true), Ordering::Greater);
        assert_eq!(compare_values(&Value::Null, &Value::Null, &ty, false), Ordering::Equal);
    }

    #[test]
    fn numeric_columns_coerce_strings() {
        assert_eq!(cmp(2, 10, "number"), Ordering::Less);
        assert_eq!(cmp("2", "10", "integer"), Ordering::Less);
        assert_eq!(cmp(2.5, 2, "double"), Ordering::Greater);
        assert_eq!(cmp("n/a", 1_000_000, "number"), Ordering::Greater);
    }

    #[test]
    fn text_columns_compare_numeric_strings_as_numbers() {
        assert_eq!(cmp("9", "10", "string"), Ordering::Less);
        assert_eq!(cmp("010", "9", "string"), Ordering::Greater);
        assert_eq!(cmp("2.50", "10", "string"), Ordering::Less);
        assert_eq!(cmp("1e3", "20", "string"), Ordering::Greater);
        assert_eq!(cmp(" 7", "10", "string"), Ordering::Less);
        assert_eq!(cmp("010", "10", "string"), Ordering::Equal);
        assert_eq!(cmp("New York", "newyork", "string"), Ordering::Equal);
        assert_eq!(cmp("apple", "Banana", "string"), Ordering::Less);
    }

    #[test]
    fn text_columns_rank_numbers_before_words() {
        assert_eq!(cmp("10", "1a", "string"), Ordering::Less);
        assert_eq!(cmp("1a", "9", "string"), Ordering::Greater);
        assert_eq!(cmp("100", "A10", "string"), Ordering::Less);
        assert_eq!(cmp("", "0", "string"), Ordering::Greater);
    }

    #[test]
    fn text_ordering_is_transitive_on_mixed_values() {
        let pool = ["9", "10", "1a", "2", "20", "2b", "100", "1", "b", "A10", "010", " 7", ""];
        let ty = ColumnType::Text;
        for a in pool {
            for b in pool {
                let ab = compare_values(&a.into(), &b.into(), &ty, true);
                assert_eq!(ab.reverse(), compare_values(&b.into(), &a.into(), &ty, true));
                for c in pool {
                    let bc = compare_values(&b.into(), &c.into(), &ty, true);
                    let ac = compare_values(&a.into(), &c.into(), &ty, true);
                    if ab != Ordering::Greater && bc != Ordering::Greater {
                        assert_ne!(ac, Ordering::Greater, "{a:?} <= {b:?} <= {c:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn temporal_columns_compare_epochs() {
        assert_eq!(cmp("2024-01-02", "2023-12-31T23:59:59Z", "datetime"), Ordering::Greater);
        assert_eq!(cmp(0, "1970-01-01", "timestamp"), Ordering::Equal);
        assert_eq!(cmp("garbage", "1970-01-01", "temporal"), Ordering::Greater);
    }

    #[test]
    fn other_types_are_all_equal() {
        assert_eq!(cmp("a", "z", "GeoPoint"), Ordering::Equal);
        assert_eq!(cmp(false, true, "boolean"), Ordering::Less);
    }

    #[test]
    fn descending_reverses_non_null_order() {
        let ty = ColumnType::Numeric;
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let a = Value::from(rng.random_range(-50..50));
            let b = Value::from(rng.random_range(-50..50));
            assert_eq!(
                compare_values(&a, &b, &ty, false),
                compare_values(&a, &b, &ty, true).reverse()
            );
        }
    }
}
