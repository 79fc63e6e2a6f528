//! Brute-force checks of index queries and filter combinators over random
//! columns.

use std::cmp::Ordering;

use jane_compute::compare_values;
use jane_expr::{CompareOp, FilterExpr};
use jane_table::{Bag, MetaData, RowFilter};
use jane_types::constants::PRIMARY_KEY_TAG;
use jane_types::{ColumnType, Record, RowPosition, RowSet, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const OPS: [CompareOp; 5] = [
    CompareOp::Lt,
    CompareOp::LtEq,
    CompareOp::Eq,
    CompareOp::GtEq,
    CompareOp::Gt,
];

fn random_bag(rng: &mut StdRng, rows: usize) -> Bag {
    let metadata = MetaData::new()
        .with_column("id", "integer", [PRIMARY_KEY_TAG])
        .and_then(|m| m.with_column("a", "integer", [] as [&str; 0]))
        .and_then(|m| m.with_column("b", "integer", [] as [&str; 0]))
        .expect("metadata");
    let records = (0..rows)
        .map(|id| {
            Record::from_iter([
                ("id", Value::from(id as i64)),
                ("a", Value::from(rng.random_range(0..20i64))),
                ("b", Value::from(rng.random_range(0..20i64))),
            ])
        })
        .collect();
    Bag::new("random", metadata, records, false)
}

fn random_subset(rng: &mut StdRng, rows: usize) -> RowSet {
    (0..rows as RowPosition)
        .filter(|_| rng.random_bool(0.6))
        .collect()
}

fn holds(op: CompareOp, lhs: i64, rhs: i64) -> bool {
    match op {
        CompareOp::Lt => lhs < rhs,
        CompareOp::LtEq => lhs <= rhs,
        CompareOp::Eq => lhs == rhs,
        CompareOp::GtEq => lhs >= rhs,
        CompareOp::Gt => lhs > rhs,
    }
}

fn brute_force(bag: &Bag, column: &str, op: CompareOp, rhs: i64, input: &RowSet) -> RowSet {
    input
        .iter()
        .filter(|pos| match bag.record(*pos).and_then(|r| r.get(column)) {
            Some(Value::Integer(v)) => holds(op, *v, rhs),
            _ => false,
        })
        .collect()
}

#[test]
fn index_queries_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..40 {
        let rows = rng.random_range(0..64usize);
        let bag = random_bag(&mut rng, rows);
        let input = random_subset(&mut rng, rows);
        let index = bag.index("a").expect("index");
        for op in OPS {
            let rhs = rng.random_range(-1..21i64);
            let got = index.query_operator(op, &Value::from(rhs), &input);
            assert_eq!(got, brute_force(&bag, "a", op, rhs, &input), "{op} {rhs}");
        }
    }
}

const WORDS: [&str; 13] = [
    "9", "10", "1a", "2", "20", "2b", "100", "1", "b", "A10", "010", " 7", "",
];

const STAMPS: [&str; 7] = [
    "2024-01-02",
    "2023-12-31T23:59:59Z",
    "1970-01-01",
    "2024-01-02T00:00:00Z",
    "garbage",
    "Garbage",
    "2001-09-09",
];

fn mixed_bag(rng: &mut StdRng, rows: usize) -> Bag {
    let metadata = MetaData::new()
        .with_column("id", "integer", [PRIMARY_KEY_TAG])
        .and_then(|m| m.with_column("s", "string", [] as [&str; 0]))
        .and_then(|m| m.with_column("t", "datetime", [] as [&str; 0]))
        .expect("metadata");
    let records = (0..rows)
        .map(|id| {
            let s = match rng.random_range(0..14usize) {
                13 => Value::Null,
                i => Value::from(WORDS[i]),
            };
            let t = match rng.random_range(0..9usize) {
                7 => Value::Null,
                8 => Value::from(rng.random_range(0..2_000_000_000_000i64)),
                i => Value::from(STAMPS[i]),
            };
            Record::from_iter([("id", Value::from(id as i64)), ("s", s), ("t", t)])
        })
        .collect();
    Bag::new("mixed", metadata, records, false)
}

/// Full scan applying the shared comparator row by row.
fn scan(bag: &Bag, column: &str, ty: &ColumnType, op: CompareOp, rhs: &Value, input: &RowSet) -> RowSet {
    input
        .iter()
        .filter(|pos| {
            let Some(record) = bag.record(*pos) else {
                return false;
            };
            let ord = compare_values(record.value_or_null(column), rhs, ty, true);
            match op {
                CompareOp::Lt => ord == Ordering::Less,
                CompareOp::LtEq => ord != Ordering::Greater,
                CompareOp::Eq => ord == Ordering::Equal,
                CompareOp::GtEq => ord != Ordering::Less,
                CompareOp::Gt => ord == Ordering::Greater,
            }
        })
        .collect()
}

#[test]
fn text_and_temporal_index_queries_match_scan() {
    let mut rng = StdRng::seed_from_u64(0xfeed);
    for _ in 0..50 {
        let rows = rng.random_range(0..300usize);
        let bag = mixed_bag(&mut rng, rows);
        let input = random_subset(&mut rng, rows);

        let text = bag.index("s").expect("text index");
        for word in WORDS {
            let rhs = Value::from(word);
            for op in OPS {
                let got = text.query_operator(op, &rhs, &input);
                let want = scan(&bag, "s", &ColumnType::Text, op, &rhs, &input);
                assert_eq!(got, want, "s {op} {word:?}");
            }
        }

        let temporal = bag.index("t").expect("temporal index");
        for stamp in STAMPS {
            let rhs = Value::from(stamp);
            for op in OPS {
                let got = temporal.query_operator(op, &rhs, &input);
                let want = scan(&bag, "t", &ColumnType::Temporal, op, &rhs, &input);
                assert_eq!(got, want, "t {op} {stamp:?}");
            }
        }
    }
}

#[test]
fn and_narrows_to_intersection_and_or_unions() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..40 {
        let rows = rng.random_range(1..80usize);
        let bag = random_bag(&mut rng, rows);
        let input = random_subset(&mut rng, rows);
        let f1 = FilterExpr::compare("a", OPS[rng.random_range(0..5)], rng.random_range(0..20i64));
        let f2 = FilterExpr::compare("b", OPS[rng.random_range(0..5)], rng.random_range(0..20i64));

        let r1 = f1.evaluate(&bag, &input).expect("f1");
        let r2 = f2.evaluate(&bag, &input).expect("f2");

        let and = FilterExpr::all_of(vec![f1.clone(), f2.clone()])
            .evaluate(&bag, &input)
            .expect("and");
        assert!(and.iter().all(|pos| r1.contains(pos)));
        assert_eq!(and, r1.and(&r2));

        let or = FilterExpr::any_of(vec![f1, f2])
            .evaluate(&bag, &input)
            .expect("or");
        assert_eq!(or, r1.or(&r2));
    }
}

#[test]
fn in_is_union_of_equalities() {
    let mut rng = StdRng::seed_from_u64(7);
    let bag = random_bag(&mut rng, 50);
    let input = bag.all_rows();
    let got = FilterExpr::is_in("a", [3i64, 5, 3])
        .evaluate(&bag, &input)
        .expect("in");
    let want = brute_force(&bag, "a", CompareOp::Eq, 3, &input)
        .or(&brute_force(&bag, "a", CompareOp::Eq, 5, &input));
    assert_eq!(got, want);
}

#[test]
fn empty_combinators_pass_input_through() {
    let mut rng = StdRng::seed_from_u64(1);
    let bag = random_bag(&mut rng, 10);
    let input = random_subset(&mut rng, 10);
    assert_eq!(FilterExpr::all_of(vec![]).evaluate(&bag, &input).expect("and"), input);
    assert_eq!(FilterExpr::any_of(vec![]).evaluate(&bag, &input).expect("or"), input);
}
