use std::fmt;

use crate::record::Record;

/// A single field value inside a [`Record`].
///
/// Values are dynamically typed; the column's declared
/// [`ColumnType`](crate::ColumnType) decides how they are interpreted when
/// they are compared, not the variant they happen to be stored as.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Nested object, e.g. the payload wrapped under a `data` key or an
    /// assembled sub-record.
    Record(Record),
}

macro_rules! impl_from_for_value {
    ($variant:ident, $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_value!(Integer, i8, i16, i32, i64, u8, u16, u32);
impl_from_for_value!(Float, f32, f64);
impl_from_for_value!(Bool, bool);
impl_from_for_value!(String, String, &str);
impl_from_for_value!(Record, Record);

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Numeric coercion: numbers as-is, booleans as 0/1, strings when they
    /// parse as a number. Null, nested records and non-numeric strings yield
    /// `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Null | Value::Record(_) => None,
        }
    }

    /// Short name of the stored variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Record(_) => "record",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => f.write_str(s),
            Value::Record(r) => {
                f.write_str("{")?;
                for (i, (key, value)) in r.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_coercion() {
        assert_eq!(Value::from(3).as_f64(), Some(3.0));
        assert_eq!(Value::from(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::from(" 42 ").as_f64(), Some(42.0));
        assert_eq!(Value::from("forty").as_f64(), None);
        assert_eq!(Value::Null.as_f64(), None);
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn display_nested_record() {
        let inner = Record::from_iter([("lat", Value::from(1.5)), ("lon", Value::from(2))]);
        let outer = Record::from_iter([("loc", Value::from(inner))]);
        assert_eq!(Value::from(outer).to_string(), "{loc: {lat: 1.5, lon: 2}}");
    }
}
