//! Opcodes understood by the query target's `compose` primitive.

use std::fmt;

/// Symbolic operation identifiers of the storage engine's query tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Membership
    IsIn,
    IsNotIn,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // Boolean
    And,
    Or,
    Xor,
    Not,

    // Unary arithmetic
    Neg,
    Abs,

    // NULL checks
    IsNull,
    NotNull,

    // String matching
    RegexMatch,
}

impl Opcode {
    /// Whether this opcode takes a single operand (the right slot is absent)
    pub fn is_unary(&self) -> bool {
        matches!(
            self,
            Opcode::Not | Opcode::Neg | Opcode::Abs | Opcode::IsNull | Opcode::NotNull
        )
    }

    /// Whether the result of this opcode is boolean
    pub fn is_predicate(&self) -> bool {
        !matches!(
            self,
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Neg | Opcode::Abs
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Opcode::Eq => "EQ",
            Opcode::Ne => "NE",
            Opcode::Lt => "LT",
            Opcode::Le => "LE",
            Opcode::Gt => "GT",
            Opcode::Ge => "GE",
            Opcode::IsIn => "ISIN",
            Opcode::IsNotIn => "ISNOTIN",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Xor => "XOR",
            Opcode::Not => "NOT",
            Opcode::Neg => "NEG",
            Opcode::Abs => "ABS",
            Opcode::IsNull => "ISNULL",
            Opcode::NotNull => "NOTNULL",
            Opcode::RegexMatch => "REGEX_MATCH",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unary_opcodes() {
        assert!(Opcode::Not.is_unary());
        assert!(Opcode::Neg.is_unary());
        assert!(Opcode::IsNull.is_unary());
        assert!(!Opcode::Add.is_unary());
        assert!(!Opcode::IsIn.is_unary());
    }

    #[test]
    fn test_predicate_opcodes() {
        assert!(Opcode::Gt.is_predicate());
        assert!(Opcode::And.is_predicate());
        assert!(!Opcode::Mul.is_predicate());
        assert!(!Opcode::Abs.is_predicate());
    }

    #[test]
    fn test_opcode_display() {
        assert_eq!(Opcode::IsNotIn.to_string(), "ISNOTIN");
        assert_eq!(Opcode::RegexMatch.as_str(), "REGEX_MATCH");
    }
}
