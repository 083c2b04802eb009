//! Immutable operation tree evaluated by the store.

use crate::access::Value;
use crate::expression::operator::Opcode;
use std::fmt;
use std::ops;

/// Operation tree node
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionNode {
    /// Column reference, identified by name only
    Column(String),

    /// Scalar constant
    Value(Value),

    /// Constant set, the right operand of `ISIN` / `ISNOTIN`
    ValueSet(Vec<Value>),

    /// Empty operand slot (the right side of unary opcodes)
    Absent,

    /// `left OPCODE right`
    Compose {
        left: Box<ExpressionNode>,
        op: Opcode,
        right: Box<ExpressionNode>,
    },
}

/// Create a column reference
pub fn col(name: impl Into<String>) -> ExpressionNode {
    ExpressionNode::column_ref(name)
}

impl ExpressionNode {
    /// Create a column reference
    pub fn column_ref(name: impl Into<String>) -> Self {
        ExpressionNode::Column(name.into())
    }

    /// Combine two operands under an opcode
    pub fn compose(left: ExpressionNode, op: Opcode, right: ExpressionNode) -> Self {
        ExpressionNode::Compose {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Apply a unary opcode
    pub fn unary(op: Opcode, operand: ExpressionNode) -> Self {
        Self::compose(operand, op, ExpressionNode::Absent)
    }

    pub fn value(value: impl Into<Value>) -> Self {
        ExpressionNode::Value(value.into())
    }

    pub fn eq(self, other: impl Into<ExpressionNode>) -> Self {
        Self::compose(self, Opcode::Eq, other.into())
    }

    pub fn ne(self, other: impl Into<ExpressionNode>) -> Self {
        Self::compose(self, Opcode::Ne, other.into())
    }

    pub fn lt(self, other: impl Into<ExpressionNode>) -> Self {
        Self::compose(self, Opcode::Lt, other.into())
    }

    pub fn le(self, other: impl Into<ExpressionNode>) -> Self {
        Self::compose(self, Opcode::Le, other.into())
    }

    pub fn gt(self, other: impl Into<ExpressionNode>) -> Self {
        Self::compose(self, Opcode::Gt, other.into())
    }

    pub fn ge(self, other: impl Into<ExpressionNode>) -> Self {
        Self::compose(self, Opcode::Ge, other.into())
    }

    /// Named form of `&`
    pub fn and(self, other: impl Into<ExpressionNode>) -> Self {
        Self::compose(self, Opcode::And, other.into())
    }

    /// Named form of `|`
    pub fn or(self, other: impl Into<ExpressionNode>) -> Self {
        Self::compose(self, Opcode::Or, other.into())
    }

    /// Membership in a constant set
    pub fn isin<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Self {
        let set = values.into_iter().map(Into::into).collect();
        Self::compose(self, Opcode::IsIn, ExpressionNode::ValueSet(set))
    }

    /// Non-membership in a constant set
    pub fn isnotin<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Self {
        let set = values.into_iter().map(Into::into).collect();
        Self::compose(self, Opcode::IsNotIn, ExpressionNode::ValueSet(set))
    }

    pub fn abs(self) -> Self {
        Self::unary(Opcode::Abs, self)
    }

    pub fn isnull(self) -> Self {
        Self::unary(Opcode::IsNull, self)
    }

    pub fn notnull(self) -> Self {
        Self::unary(Opcode::NotNull, self)
    }

    pub fn regex_match(self, pattern: impl Into<String>) -> Self {
        Self::compose(self, Opcode::RegexMatch, ExpressionNode::Value(Value::String(pattern.into())))
    }
}

impl From<Value> for ExpressionNode {
    fn from(value: Value) -> Self {
        ExpressionNode::Value(value)
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ExpressionNode {
                fn from(v: $ty) -> Self {
                    ExpressionNode::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_from_scalar!(bool, i32, i64, f64, &str, String);

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $opcode:expr) => {
        impl<T: Into<ExpressionNode>> ops::$trait<T> for ExpressionNode {
            type Output = ExpressionNode;

            fn $method(self, rhs: T) -> ExpressionNode {
                ExpressionNode::compose(self, $opcode, rhs.into())
            }
        }
    };
}

impl_binary_op!(Add, add, Opcode::Add);
impl_binary_op!(Sub, sub, Opcode::Sub);
impl_binary_op!(Mul, mul, Opcode::Mul);
impl_binary_op!(Div, div, Opcode::Div);
impl_binary_op!(BitAnd, bitand, Opcode::And);
impl_binary_op!(BitOr, bitor, Opcode::Or);
impl_binary_op!(BitXor, bitxor, Opcode::Xor);

impl ops::Not for ExpressionNode {
    type Output = ExpressionNode;

    fn not(self) -> ExpressionNode {
        ExpressionNode::unary(Opcode::Not, self)
    }
}

impl ops::Neg for ExpressionNode {
    type Output = ExpressionNode;

    fn neg(self) -> ExpressionNode {
        ExpressionNode::unary(Opcode::Neg, self)
    }
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionNode::Column(name) => write!(f, "Column[{:?}]", name),
            ExpressionNode::Value(Value::String(s)) => write!(f, "{:?}", s),
            ExpressionNode::Value(v) => write!(f, "{}", v),
            ExpressionNode::ValueSet(values) => {
                let items: Vec<String> = values
                    .iter()
                    .map(|v| ExpressionNode::Value(v.clone()).to_string())
                    .collect();
                write!(f, "[{}]", items.join(", "))
            }
            ExpressionNode::Absent => write!(f, "None"),
            ExpressionNode::Compose { left, op, right } => {
                if op.is_unary() && **right == ExpressionNode::Absent {
                    write!(f, "{}({})", op, left)
                } else {
                    write!(f, "({} {} {})", left, op, right)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_matches_compose() {
        let built = col("a").gt(4) & col("b").lt(19.5);
        let composed = ExpressionNode::compose(
            ExpressionNode::compose(col("a"), Opcode::Gt, ExpressionNode::value(4i64)),
            Opcode::And,
            ExpressionNode::compose(col("b"), Opcode::Lt, ExpressionNode::value(19.5)),
        );
        assert_eq!(built, composed);
    }

    #[test]
    fn test_unary_builders_leave_right_absent() {
        assert_eq!(
            !col("flag"),
            ExpressionNode::compose(col("flag"), Opcode::Not, ExpressionNode::Absent)
        );
        assert_eq!(
            -col("x"),
            ExpressionNode::compose(col("x"), Opcode::Neg, ExpressionNode::Absent)
        );
    }

    #[test]
    fn test_isin_builds_value_set() {
        let node = col("a").isin([1i64, 2, 3]);
        match node {
            ExpressionNode::Compose { op, right, .. } => {
                assert_eq!(op, Opcode::IsIn);
                assert_eq!(
                    *right,
                    ExpressionNode::ValueSet(vec![Value::Int64(1), Value::Int64(2), Value::Int64(3)])
                );
            }
            other => panic!("Expected Compose, got {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        let node = (col("a") + 1).gt(col("b")) | col("name").eq("x").isnull();
        assert_eq!(
            node.to_string(),
            "(((Column[\"a\"] ADD 1) GT Column[\"b\"]) OR ISNULL((Column[\"name\"] EQ \"x\")))"
        );
    }
}
