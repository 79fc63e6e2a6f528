//! Filter predicate AST.
//!
//! The AST only describes *what* to match. Evaluating it against a bag's
//! indexes lives in `jane-table`, next to the indexes themselves.
#![forbid(unsafe_code)]

use std::str::FromStr;

use jane_result::Error;
use jane_types::Value;

/// Logical filter over index-backed predicates.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterExpr {
    /// `column <op> value`.
    Operator {
        column: String,
        op: CompareOp,
        value: Value,
    },
    /// `column` equals any of `values`.
    In { column: String, values: Vec<Value> },
    /// Every child matches. Children are applied as successive narrowing
    /// passes, each one searching only what the previous ones kept.
    And(Vec<FilterExpr>),
    /// At least one child matches. Every child searches the full input.
    Or(Vec<FilterExpr>),
}

/// Relational operators supported by sorted column indexes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Lt,
    LtEq,
    Eq,
    GtEq,
    Gt,
}

impl FromStr for CompareOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::LtEq),
            "=" | "==" => Ok(CompareOp::Eq),
            ">=" => Ok(CompareOp::GtEq),
            ">" => Ok(CompareOp::Gt),
            other => Err(Error::InvalidArgumentError(format!(
                "unknown comparison operator '{other}'"
            ))),
        }
    }
}

impl FilterExpr {
    /// Build a single comparison leaf.
    #[inline]
    pub fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        FilterExpr::Operator {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    #[inline]
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    #[inline]
    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    #[inline]
    pub fn lt_eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::LtEq, value)
    }

    #[inline]
    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    #[inline]
    pub fn gt_eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::GtEq, value)
    }

    /// Build a set-membership leaf.
    pub fn is_in<V: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        FilterExpr::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Build an AND of filters.
    #[inline]
    pub fn all_of(filters: Vec<FilterExpr>) -> Self {
        FilterExpr::And(filters)
    }

    /// Build an OR of filters.
    #[inline]
    pub fn any_of(filters: Vec<FilterExpr>) -> Self {
        FilterExpr::Or(filters)
    }

    /// Column names referenced anywhere in the expression, in visit order,
    /// without duplicates.
    pub fn columns(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            FilterExpr::Operator { column, .. } | FilterExpr::In { column, .. } => {
                if !out.contains(&column.as_str()) {
                    out.push(column);
                }
            }
            FilterExpr::And(children) | FilterExpr::Or(children) => {
                for child in children {
                    child.collect_columns(out);
                }
            }
        }
    }
}
