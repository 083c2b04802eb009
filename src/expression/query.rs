//! Query targets.
//!
//! A [`QueryTarget`] is the composable object a translation feeds. It hands
//! out operands through `column_reference`, `literal`, `absent` and
//! `compose`, and accepts a finished root through `apply_filter` or
//! `apply_projection`. [`QueryBuilder`] is the storage engine's own target.

use crate::access::Value;
use crate::expression::node::ExpressionNode;
use crate::expression::operator::Opcode;
use std::fmt;

/// Composable query object built bottom-up by the translator
pub trait QueryTarget: Sized {
    /// Reference to a composed subtree
    type Operand: Clone + fmt::Debug;

    fn column_reference(&self, name: &str) -> Self::Operand;

    fn literal(&self, value: Value) -> Self::Operand;

    /// Placeholder for an empty operand slot
    fn absent(&self) -> Self::Operand;

    fn compose(&self, left: Self::Operand, op: Opcode, right: Self::Operand) -> Self::Operand;

    /// Add a row filter, returning the updated target
    fn apply_filter(self, predicate: Self::Operand) -> Self;

    /// Add a computed output column, returning the updated target
    fn apply_projection(self, name: &str, expr: Self::Operand) -> Self;
}

/// One stage of a query, applied in order by the store
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Keep rows whose predicate evaluates to true
    Filter(ExpressionNode),

    /// Add (or replace) a column computed from `expr`
    Project { name: String, expr: ExpressionNode },
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Filter(predicate) => write!(f, "WHERE {}", predicate),
            Clause::Project { name, expr } => write!(f, "APPLY {} = {}", name, expr),
        }
    }
}

/// The storage engine's query builder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    clauses: Vec<Clause>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter clause
    pub fn filter(mut self, predicate: ExpressionNode) -> Self {
        self.clauses.push(Clause::Filter(predicate));
        self
    }

    /// Append a computed column clause
    pub fn project(mut self, name: impl Into<String>, expr: ExpressionNode) -> Self {
        self.clauses.push(Clause::Project {
            name: name.into(),
            expr,
        });
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl QueryTarget for QueryBuilder {
    type Operand = ExpressionNode;

    fn column_reference(&self, name: &str) -> ExpressionNode {
        ExpressionNode::column_ref(name)
    }

    fn literal(&self, value: Value) -> ExpressionNode {
        ExpressionNode::Value(value)
    }

    fn absent(&self) -> ExpressionNode {
        ExpressionNode::Absent
    }

    fn compose(&self, left: ExpressionNode, op: Opcode, right: ExpressionNode) -> ExpressionNode {
        ExpressionNode::compose(left, op, right)
    }

    fn apply_filter(self, predicate: ExpressionNode) -> Self {
        self.filter(predicate)
    }

    fn apply_projection(self, name: &str, expr: ExpressionNode) -> Self {
        self.project(name, expr)
    }
}

impl fmt::Display for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.is_empty() {
            return write!(f, "<empty query>");
        }
        let rendered: Vec<String> = self.clauses.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", rendered.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::node::col;

    #[test]
    fn test_builder_accumulates_clauses_in_order() {
        let q = QueryBuilder::new()
            .filter(col("a").gt(4))
            .project("c", col("a") * 2);
        assert_eq!(q.clauses().len(), 2);
        assert!(matches!(q.clauses()[0], Clause::Filter(_)));
        assert!(matches!(q.clauses()[1], Clause::Project { .. }));
    }

    #[test]
    fn test_target_primitives() {
        let q = QueryBuilder::new();
        let left = q.column_reference("a");
        let right = q.literal(Value::Int64(4));
        let node = q.compose(left, Opcode::Gt, right);
        let q = q.apply_filter(node);
        assert_eq!(q, QueryBuilder::new().filter(col("a").gt(4)));
    }

    #[test]
    fn test_display() {
        assert_eq!(QueryBuilder::new().to_string(), "<empty query>");
        let q = QueryBuilder::new()
            .filter(col("a").gt(4))
            .project("neg", -col("b"));
        assert_eq!(
            q.to_string(),
            "WHERE (Column[\"a\"] GT 4) APPLY neg = NEG(Column[\"b\"])"
        );
    }
}
