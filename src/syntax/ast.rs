// Source expression tree produced by the parser

use crate::access::Value;

/// Binary arithmetic and bitwise operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    BitOr,
    BitAnd,
    BitXor,
    LShift,
    RShift,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::FloorDiv => "//",
            BinaryOperator::Mod => "%",
            BinaryOperator::Pow => "**",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitXor => "^",
            BinaryOperator::LShift => "<<",
            BinaryOperator::RShift => ">>",
        }
    }
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// `~x`
    Invert,
    /// `-x`
    Neg,
    /// `+x`
    Pos,
    /// `not x`
    Not,
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Invert => "~",
            UnaryOperator::Neg => "-",
            UnaryOperator::Pos => "+",
            UnaryOperator::Not => "not",
        }
    }
}

/// Comparison operators, chainable as in `a < b <= c`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperator {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
    Is,
    IsNot,
}

impl CompareOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOperator::Eq => "==",
            CompareOperator::NotEq => "!=",
            CompareOperator::Lt => "<",
            CompareOperator::LtE => "<=",
            CompareOperator::Gt => ">",
            CompareOperator::GtE => ">=",
            CompareOperator::In => "in",
            CompareOperator::NotIn => "not in",
            CompareOperator::Is => "is",
            CompareOperator::IsNot => "is not",
        }
    }
}

/// `and` / `or`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOperator {
    And,
    Or,
}

/// Keyword argument of a call, `name=value`
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub name: String,
    pub value: SourceExpr,
}

/// Immutable source expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum SourceExpr {
    /// Number, string, boolean or `None`
    Literal(Value),

    /// Bare name
    Name(String),

    /// `func(args..., name=value...)`
    Call {
        func: Box<SourceExpr>,
        args: Vec<SourceExpr>,
        keywords: Vec<Keyword>,
    },

    /// `value.attr`
    Attribute { value: Box<SourceExpr>, attr: String },

    /// `left op1 right1 op2 right2 ...`
    Compare {
        left: Box<SourceExpr>,
        comparisons: Vec<(CompareOperator, SourceExpr)>,
    },

    BinaryOp {
        left: Box<SourceExpr>,
        op: BinaryOperator,
        right: Box<SourceExpr>,
    },

    UnaryOp {
        op: UnaryOperator,
        operand: Box<SourceExpr>,
    },

    /// `a and b and c`
    BoolOp {
        op: BoolOperator,
        values: Vec<SourceExpr>,
    },

    List(Vec<SourceExpr>),

    Tuple(Vec<SourceExpr>),

    /// `value[index]`
    Subscript {
        value: Box<SourceExpr>,
        index: Box<SourceExpr>,
    },
}

impl SourceExpr {
    /// Short node-kind name used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            SourceExpr::Literal(_) => "Literal",
            SourceExpr::Name(_) => "Name",
            SourceExpr::Call { .. } => "Call",
            SourceExpr::Attribute { .. } => "Attribute",
            SourceExpr::Compare { .. } => "Compare",
            SourceExpr::BinaryOp { .. } => "BinaryOp",
            SourceExpr::UnaryOp { .. } => "UnaryOp",
            SourceExpr::BoolOp { .. } => "BoolOp",
            SourceExpr::List(_) => "List",
            SourceExpr::Tuple(_) => "Tuple",
            SourceExpr::Subscript { .. } => "Subscript",
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        SourceExpr::Name(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        SourceExpr::Literal(value.into())
    }

    pub fn call(func: SourceExpr, args: Vec<SourceExpr>) -> Self {
        SourceExpr::Call {
            func: Box::new(func),
            args,
            keywords: Vec::new(),
        }
    }

    pub fn binary_op(left: SourceExpr, op: BinaryOperator, right: SourceExpr) -> Self {
        SourceExpr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn unary_op(op: UnaryOperator, operand: SourceExpr) -> Self {
        SourceExpr::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let call = SourceExpr::call(SourceExpr::name("col"), vec![SourceExpr::literal("a")]);
        assert_eq!(call.kind(), "Call");
        match call {
            SourceExpr::Call { func, args, keywords } => {
                assert_eq!(*func, SourceExpr::Name("col".to_string()));
                assert_eq!(args, vec![SourceExpr::Literal(Value::String("a".into()))]);
                assert!(keywords.is_empty());
            }
            _ => panic!("Expected Call"),
        }
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(BinaryOperator::FloorDiv.as_str(), "//");
        assert_eq!(UnaryOperator::Invert.as_str(), "~");
        assert_eq!(CompareOperator::NotIn.as_str(), "not in");
    }
}
