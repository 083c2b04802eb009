//! Expression translation.
//!
//! Turns the textual rendering of a client-side expression into an operation
//! tree for a [`QueryTarget`]. Translation runs in three steps:
//!
//! 1. the surface normalizer rewrites engine-specific notation
//! 2. the parser builds a [`SourceExpr`]
//! 3. the tree is walked post-order and every node is turned into an operand
//!    through the target's primitives; the root is submitted once
//!
//! Literals and bare names are carried through the walk as raw values so the
//! column accessor can read its argument; they only become target operands
//! when they are used as one.

use crate::access::Value;
use crate::config::{CallPolicy, TranslatorConfig};
use crate::expression::error::{TranslateError, TranslateResult};
use crate::expression::operator::Opcode;
use crate::expression::query::QueryTarget;
use crate::syntax::{
    parse_expression, BinaryOperator, CompareOperator, DebugFormatNormalizer, SourceExpr,
    SurfaceNormalizer, UnaryOperator,
};
use log::{trace, warn};

/// Intermediate result of visiting one source node
#[derive(Debug, Clone)]
enum Translated<O> {
    Operand(O),
    Literal(Value),
    Name(String),
    Absent,
}

/// Compiles expression text against a query target
pub struct Translator {
    config: TranslatorConfig,
    normalizer: Box<dyn SurfaceNormalizer>,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator {
    pub fn new() -> Self {
        Self::with_config(TranslatorConfig::default())
    }

    pub fn with_config(config: TranslatorConfig) -> Self {
        Self {
            config,
            normalizer: Box::new(DebugFormatNormalizer),
        }
    }

    /// Replace the surface normalizer
    pub fn with_normalizer<N: SurfaceNormalizer + 'static>(mut self, normalizer: N) -> Self {
        self.normalizer = Box::new(normalizer);
        self
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Normalize and parse `text`
    pub fn parse(&self, text: &str) -> TranslateResult<SourceExpr> {
        let normalized = self.normalizer.normalize(text);
        trace!("Normalized {:?} to {:?}", text, normalized);
        parse_expression(&normalized).map_err(|e| TranslateError::invalid(text, e))
    }

    /// Compile `text` and add it to `target` as a row filter.
    ///
    /// An expression that compiles to nothing (for example a lone unknown
    /// call under the lenient policy) leaves the target unchanged. On error
    /// the target is dropped.
    pub fn translate<T: QueryTarget>(&self, text: &str, target: T) -> TranslateResult<T> {
        let expr = self.parse(text)?;
        match self.compile(&expr, &target)? {
            Some(predicate) => {
                trace!("Compiled filter {:?}", predicate);
                Ok(target.apply_filter(predicate))
            }
            None => {
                warn!("Expression {:?} compiled to nothing; no filter applied", text);
                Ok(target)
            }
        }
    }

    /// Compile `text` and add it to `target` as the computed column `name`
    pub fn translate_projection<T: QueryTarget>(
        &self,
        text: &str,
        name: &str,
        target: T,
    ) -> TranslateResult<T> {
        let expr = self.parse(text)?;
        match self.compile(&expr, &target)? {
            Some(value) => Ok(target.apply_projection(name, value)),
            None => {
                warn!("Projection {:?} compiled to nothing; column {} not added", text, name);
                Ok(target)
            }
        }
    }

    /// Compile a parsed tree into one root operand of `target`
    pub fn compile<T: QueryTarget>(
        &self,
        expr: &SourceExpr,
        target: &T,
    ) -> TranslateResult<Option<T::Operand>> {
        match self.visit(expr, target)? {
            Translated::Absent => Ok(None),
            Translated::Name(name) => Err(TranslateError::unsupported(format!(
                "bare name '{}' as an expression",
                name
            ))),
            other => self.operand(other, target).map(Some),
        }
    }

    fn visit<T: QueryTarget>(
        &self,
        expr: &SourceExpr,
        target: &T,
    ) -> TranslateResult<Translated<T::Operand>> {
        match expr {
            SourceExpr::Literal(value) => Ok(Translated::Literal(value.clone())),

            SourceExpr::Name(name) => Ok(Translated::Name(name.clone())),

            SourceExpr::Call {
                func,
                args,
                keywords,
            } => self.visit_call(func, args, keywords, target),

            SourceExpr::Attribute { value, attr } => {
                self.visit(value, target)?;
                Err(TranslateError::unsupported(format!(
                    "attribute access '.{}'",
                    attr
                )))
            }

            SourceExpr::Compare { left, comparisons } => {
                let mut left = self.visit(left, target)?;
                for (op, right) in comparisons {
                    let right = self.visit(right, target)?;
                    let opcode = compare_opcode(*op)?;
                    left = Translated::Operand(self.compose(left, opcode, right, target)?);
                }
                Ok(left)
            }

            SourceExpr::BinaryOp { left, op, right } => {
                let left = self.visit(left, target)?;
                let right = self.visit(right, target)?;
                let opcode = binary_opcode(*op)?;
                Ok(Translated::Operand(self.compose(left, opcode, right, target)?))
            }

            SourceExpr::UnaryOp { op, operand } => {
                let operand = self.visit(operand, target)?;
                let opcode = unary_opcode(*op)?;
                Ok(Translated::Operand(self.compose(
                    operand,
                    opcode,
                    Translated::Absent,
                    target,
                )?))
            }

            SourceExpr::BoolOp { .. }
            | SourceExpr::List(_)
            | SourceExpr::Tuple(_)
            | SourceExpr::Subscript { .. } => Err(TranslateError::unsupported(format!(
                "{} expression",
                expr.kind()
            ))),
        }
    }

    fn visit_call<T: QueryTarget>(
        &self,
        func: &SourceExpr,
        args: &[SourceExpr],
        keywords: &[crate::syntax::Keyword],
        target: &T,
    ) -> TranslateResult<Translated<T::Operand>> {
        let callee = match func {
            SourceExpr::Name(name) => Some(name.as_str()),
            SourceExpr::Attribute { attr, .. } => {
                return Err(TranslateError::unsupported(format!(
                    "method call '.{}(...)'",
                    attr
                )));
            }
            _ => None,
        };

        let mut translated = Vec::with_capacity(args.len());
        for arg in args {
            translated.push(self.visit(arg, target)?);
        }
        for keyword in keywords {
            self.visit(&keyword.value, target)?;
        }

        if callee == Some(self.config.column_accessor.as_str()) {
            return match translated.into_iter().next() {
                None => Ok(Translated::Absent),
                Some(Translated::Literal(Value::String(name))) | Some(Translated::Name(name)) => {
                    Ok(Translated::Operand(target.column_reference(&name)))
                }
                Some(_) => Err(TranslateError::unsupported(format!(
                    "{}() argument that is not a column name",
                    self.config.column_accessor
                ))),
            };
        }

        let called = match callee {
            Some(name) => format!("function '{}'", name),
            None => format!("a {} expression", func.kind()),
        };
        match self.config.unknown_calls {
            CallPolicy::Lenient => {
                warn!("Ignoring call to unsupported {}", called);
                Ok(Translated::Absent)
            }
            CallPolicy::Strict => Err(TranslateError::unsupported(format!("call to {}", called))),
        }
    }

    fn compose<T: QueryTarget>(
        &self,
        left: Translated<T::Operand>,
        opcode: Opcode,
        right: Translated<T::Operand>,
        target: &T,
    ) -> TranslateResult<T::Operand> {
        let left = self.operand(left, target)?;
        let right = self.operand(right, target)?;
        Ok(target.compose(left, opcode, right))
    }

    fn operand<T: QueryTarget>(
        &self,
        translated: Translated<T::Operand>,
        target: &T,
    ) -> TranslateResult<T::Operand> {
        match translated {
            Translated::Operand(operand) => Ok(operand),
            Translated::Literal(value) => Ok(target.literal(value)),
            Translated::Absent => Ok(target.absent()),
            Translated::Name(name) => Err(TranslateError::unsupported(format!(
                "bare name '{}' as an operand",
                name
            ))),
        }
    }
}

/// Translate `text` into a filter on `target` with default settings
pub fn translate<T: QueryTarget>(text: &str, target: T) -> TranslateResult<T> {
    Translator::new().translate(text, target)
}

fn compare_opcode(op: CompareOperator) -> TranslateResult<Opcode> {
    match op {
        CompareOperator::Eq => Ok(Opcode::Eq),
        CompareOperator::NotEq => Ok(Opcode::Ne),
        CompareOperator::Lt => Ok(Opcode::Lt),
        CompareOperator::LtE => Ok(Opcode::Le),
        CompareOperator::Gt => Ok(Opcode::Gt),
        CompareOperator::GtE => Ok(Opcode::Ge),
        CompareOperator::In => Ok(Opcode::IsIn),
        CompareOperator::NotIn => Ok(Opcode::IsNotIn),
        CompareOperator::Is | CompareOperator::IsNot => Err(TranslateError::unsupported(
            format!("comparison operator '{}'", op.as_str()),
        )),
    }
}

fn binary_opcode(op: BinaryOperator) -> TranslateResult<Opcode> {
    match op {
        BinaryOperator::Add => Ok(Opcode::Add),
        BinaryOperator::Sub => Ok(Opcode::Sub),
        BinaryOperator::Mul => Ok(Opcode::Mul),
        BinaryOperator::Div => Ok(Opcode::Div),
        BinaryOperator::BitOr => Ok(Opcode::Or),
        BinaryOperator::BitAnd => Ok(Opcode::And),
        BinaryOperator::FloorDiv
        | BinaryOperator::Mod
        | BinaryOperator::Pow
        | BinaryOperator::BitXor
        | BinaryOperator::LShift
        | BinaryOperator::RShift => Err(TranslateError::unsupported(format!(
            "binary operator '{}'",
            op.as_str()
        ))),
    }
}

fn unary_opcode(op: UnaryOperator) -> TranslateResult<Opcode> {
    match op {
        UnaryOperator::Invert => Ok(Opcode::Not),
        UnaryOperator::Neg => Ok(Opcode::Neg),
        UnaryOperator::Pos | UnaryOperator::Not => Err(TranslateError::unsupported(format!(
            "unary operator '{}'",
            op.as_str()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::node::{col, ExpressionNode};
    use crate::expression::query::QueryBuilder;
    use crate::syntax::Verbatim;

    fn filter_of(text: &str) -> TranslateResult<QueryBuilder> {
        translate(text, QueryBuilder::new())
    }

    #[test]
    fn test_simple_comparison() {
        let q = filter_of("[(col(\"a\")) > (dyn int: 4)]").unwrap();
        assert_eq!(q, QueryBuilder::new().filter(col("a").gt(4)));
    }

    #[test]
    fn test_conjunction() {
        let q = filter_of("[([(col(\"a\")) > (dyn int: 4)]) & ([(col(\"b\")) < (dyn int: 19)])]")
            .unwrap();
        assert_eq!(
            q,
            QueryBuilder::new().filter(col("a").gt(4) & col("b").lt(19))
        );
    }

    #[test]
    fn test_chained_comparison_folds_left() {
        let q = filter_of("1 < col(\"a\") < 5").unwrap();
        let expected = ExpressionNode::value(1i64).lt(col("a")).lt(5);
        assert_eq!(q, QueryBuilder::new().filter(expected));
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(
            filter_of("~(col(\"flag\"))").unwrap(),
            QueryBuilder::new().filter(!col("flag"))
        );
        assert_eq!(
            filter_of("-(col(\"x\")) > 1").unwrap(),
            QueryBuilder::new().filter((-col("x")).gt(1))
        );
    }

    #[test]
    fn test_membership() {
        assert_eq!(
            filter_of("\"x\" in col(\"tags\")").unwrap(),
            QueryBuilder::new().filter(ExpressionNode::compose(
                ExpressionNode::value("x"),
                Opcode::IsIn,
                col("tags")
            ))
        );
        let q = filter_of("col(\"a\") not in col(\"b\")").unwrap();
        assert_eq!(
            q,
            QueryBuilder::new().filter(ExpressionNode::compose(
                col("a"),
                Opcode::IsNotIn,
                col("b")
            ))
        );
    }

    #[test]
    fn test_unsupported_constructs() {
        for text in [
            "col(\"a\") % 2",
            "col(\"a\") // 2",
            "col(\"a\") ** 2",
            "col(\"a\").abs()",
            "col(\"a\").name",
            "col(\"a\") is None",
            "not col(\"a\")",
            "+col(\"a\")",
            "col(\"a\") in [1, 2]",
            "col(\"a\")[0]",
            "(col(\"a\"), 1)",
            "col(\"a\") > 1 and col(\"b\") < 2",
            "a",
            "a > 1",
        ] {
            let err = filter_of(text).unwrap_err();
            assert!(
                matches!(err, TranslateError::UnsupportedConstruct(_)),
                "{} -> {:?}",
                text,
                err
            );
        }
    }

    #[test]
    fn test_invalid_expression_keeps_original_text() {
        let err = filter_of("[(col(\"a\")) > ]").unwrap_err();
        match err {
            TranslateError::InvalidExpression { text, .. } => {
                assert_eq!(text, "[(col(\"a\")) > ]")
            }
            other => panic!("Expected InvalidExpression, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_call_policy() {
        let q = filter_of("lit(3)").unwrap();
        assert!(q.is_empty());

        let q = filter_of("col(\"a\") > lit(3)").unwrap();
        assert_eq!(
            q,
            QueryBuilder::new().filter(col("a").gt(ExpressionNode::Absent))
        );

        let strict = Translator::with_config(
            TranslatorConfig::default().with_call_policy(CallPolicy::Strict),
        );
        let err = strict.translate("lit(3)", QueryBuilder::new()).unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedConstruct(_)));
    }

    #[test]
    fn test_call_of_computed_callee_follows_policy() {
        let q = filter_of("col(\"a\") > col(\"b\")(\"c\")").unwrap();
        assert_eq!(
            q,
            QueryBuilder::new().filter(col("a").gt(ExpressionNode::Absent))
        );
        assert!(filter_of("(col(\"a\"))(1)").unwrap().is_empty());

        let strict = Translator::with_config(
            TranslatorConfig::default().with_call_policy(CallPolicy::Strict),
        );
        let err = strict
            .translate("col(\"b\")(\"c\")", QueryBuilder::new())
            .unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedConstruct(_)));
    }

    #[test]
    fn test_unknown_call_arguments_are_checked() {
        let err = filter_of("lit(col(\"a\") % 2)").unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedConstruct(_)));
    }

    #[test]
    fn test_column_accessor_arguments() {
        assert_eq!(
            filter_of("col(a) == 1").unwrap(),
            QueryBuilder::new().filter(col("a").eq(1))
        );
        assert!(filter_of("col()").unwrap().is_empty());
        let err = filter_of("col(1) == 1").unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedConstruct(_)));
    }

    #[test]
    fn test_custom_accessor_and_normalizer() {
        let translator = Translator::with_config(
            TranslatorConfig::default().with_column_accessor("field"),
        )
        .with_normalizer(Verbatim);
        let q = translator
            .translate("field(\"a\") >= 2.5", QueryBuilder::new())
            .unwrap();
        assert_eq!(q, QueryBuilder::new().filter(col("a").ge(2.5)));
    }

    #[test]
    fn test_projection() {
        let q = Translator::new()
            .translate_projection("(col(\"a\")) * (dyn int: 2)", "double", QueryBuilder::new())
            .unwrap();
        assert_eq!(q, QueryBuilder::new().project("double", col("a") * 2));
    }

    #[test]
    fn test_literal_root_becomes_filter() {
        let q = filter_of("True").unwrap();
        assert_eq!(q, QueryBuilder::new().filter(ExpressionNode::value(true)));
    }
}
