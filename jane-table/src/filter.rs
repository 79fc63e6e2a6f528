//! Filter evaluation over a bag's indexes.
//!
//! Filters never look at records directly: every leaf is answered by the
//! bag's sorted index for the leaf's column, and the combinators are set
//! algebra over row positions.

#![forbid(unsafe_code)]

use std::fmt;

use jane_expr::{CompareOp, FilterExpr};
use jane_result::Result as JaneResult;
use jane_types::{RowSet, Value};

use crate::bag::Bag;

/// Capability of any filter plugin: narrow a set of row positions of `bag`.
///
/// Implementations must return a subset of `rows`.
pub trait RowFilter: fmt::Debug {
    fn evaluate(&self, bag: &Bag, rows: &RowSet) -> JaneResult<RowSet>;
}

impl RowFilter for FilterExpr {
    fn evaluate(&self, bag: &Bag, rows: &RowSet) -> JaneResult<RowSet> {
        match self {
            FilterExpr::Operator { column, op, value } => {
                Ok(bag.index(column)?.query_operator(*op, value, rows))
            }
            FilterExpr::In { column, values } => evaluate_in(bag, column, values, rows),
            FilterExpr::And(children) => {
                // Each child only searches what the previous children kept.
                let mut acc = rows.clone();
                for child in children {
                    let narrowed = child.evaluate(bag, &acc)?;
                    acc.and_inplace(&narrowed);
                }
                Ok(acc)
            }
            FilterExpr::Or(children) => {
                // An empty disjunction places no constraint, like an empty
                // conjunction.
                if children.is_empty() {
                    return Ok(rows.clone());
                }
                let mut acc = RowSet::new();
                for child in children {
                    acc.or_inplace(&child.evaluate(bag, rows)?);
                }
                Ok(acc)
            }
        }
    }
}

fn evaluate_in(bag: &Bag, column: &str, values: &[Value], rows: &RowSet) -> JaneResult<RowSet> {
    let index = bag.index(column)?;
    let mut acc = RowSet::new();
    for value in values {
        acc.or_inplace(&index.query_operator(CompareOp::Eq, value, rows));
    }
    Ok(acc)
}
