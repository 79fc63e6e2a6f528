//! Lightweight formatting helpers for expression enums.

use std::fmt;

use jane_types::Value;

use crate::{CompareOp, FilterExpr};

impl CompareOp {
    /// Render the operator as a human-readable symbol.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Eq => "=",
            CompareOp::GtEq => ">=",
            CompareOp::Gt => ">",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => write!(f, "{s:?}"),
        other => write!(f, "{other}"),
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[FilterExpr], sep: &str) -> fmt::Result {
    if children.is_empty() {
        return f.write_str("()");
    }
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " {sep} ")?;
        }
        match child {
            FilterExpr::And(_) | FilterExpr::Or(_) => write!(f, "({child})")?,
            _ => write!(f, "{child}")?,
        }
    }
    Ok(())
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpr::Operator { column, op, value } => {
                write!(f, "{column} {op} ")?;
                write_literal(f, value)
            }
            FilterExpr::In { column, values } => {
                write!(f, "{column} IN (")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_literal(f, value)?;
                }
                f.write_str(")")
            }
            FilterExpr::And(children) => write_joined(f, children, "AND"),
            FilterExpr::Or(children) => write_joined(f, children, "OR"),
        }
    }
}
