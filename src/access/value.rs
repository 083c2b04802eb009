use arrow::datatypes::{DataType as ArrowType, TimeUnit};
use std::cmp::Ordering;
use std::fmt;

/// Logical column types the evaluator works with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    Int64,
    Float64,
    Utf8,
    /// Nanoseconds since the Unix epoch
    Timestamp,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Boolean => "bool",
            DataType::Int64 => "i64",
            DataType::Float64 => "f64",
            DataType::Utf8 => "str",
            DataType::Timestamp => "datetime[ns]",
        }
    }

    /// Arrow type of a column holding this logical type
    pub fn to_arrow(self) -> ArrowType {
        match self {
            DataType::Boolean => ArrowType::Boolean,
            DataType::Int64 => ArrowType::Int64,
            DataType::Float64 => ArrowType::Float64,
            DataType::Utf8 => ArrowType::Utf8,
            DataType::Timestamp => ArrowType::Timestamp(TimeUnit::Nanosecond, None),
        }
    }

    /// Logical type of an arrow column, `None` for types the evaluator can't read
    pub fn from_arrow(data_type: &ArrowType) -> Option<DataType> {
        match data_type {
            ArrowType::Boolean => Some(DataType::Boolean),
            ArrowType::Int64 => Some(DataType::Int64),
            ArrowType::Float64 => Some(DataType::Float64),
            ArrowType::Utf8 => Some(DataType::Utf8),
            ArrowType::Timestamp(TimeUnit::Nanosecond, _) => Some(DataType::Timestamp),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single scalar value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    String(String),
    Timestamp(i64),
}

impl Value {
    /// Get the data type of this value
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::String(_) => Some(DataType::Utf8),
            Value::Timestamp(_) => Some(DataType::Timestamp),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view used for mixed integer/float arithmetic and comparison
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(i) => Some(*i as f64),
            Value::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Compare two non-null values.
    ///
    /// Integers and floats compare numerically with each other; NaN is equal
    /// to itself and greater than every number. Values of unrelated types (or
    /// any NULL) are not comparable and yield `None`.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Int64(b)) | (Value::Int64(a), Value::Timestamp(b)) => {
                Some(a.cmp(b))
            }
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => Some(compare_floats(x, y)),
                _ => None,
            },
        }
    }
}

fn compare_floats(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float64(v) => write!(f, "{:?}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::Timestamp(ns) => write!(f, "{}ns", ns),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_numeric_compare() {
        assert_eq!(
            Value::Int64(2).compare(&Value::Float64(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Float64(3.0).compare(&Value::Int64(3)),
            Some(Ordering::Equal)
        );
        assert_eq!(Value::Int64(1).compare(&Value::String("1".into())), None);
        assert_eq!(Value::Null.compare(&Value::Null), None);
    }

    #[test]
    fn test_nan_orders_above_numbers() {
        let nan = Value::Float64(f64::NAN);
        assert_eq!(nan.compare(&Value::Int64(2)), Some(Ordering::Greater));
        assert_eq!(
            Value::Float64(f64::INFINITY).compare(&nan),
            Some(Ordering::Less)
        );
        assert_eq!(nan.compare(&Value::Float64(f64::NAN)), Some(Ordering::Equal));
        assert_eq!(
            Value::Float64(-0.0).compare(&Value::Float64(0.0)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_arrow_types() {
        for data_type in [
            DataType::Boolean,
            DataType::Int64,
            DataType::Float64,
            DataType::Utf8,
            DataType::Timestamp,
        ] {
            assert_eq!(DataType::from_arrow(&data_type.to_arrow()), Some(data_type));
        }
        assert_eq!(DataType::from_arrow(&ArrowType::Int32), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Float64(2.0).to_string(), "2.0");
        assert_eq!(Value::Int64(-4).to_string(), "-4");
        assert_eq!(DataType::Float64.to_string(), "f64");
    }
}
