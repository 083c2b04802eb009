//! Server-side evaluation of query trees over a batch.

use crate::access::{array_from_values, value_at, with_column, DataType, RecordBatch, Value};
use crate::expression::{Clause, ExpressionNode, Opcode, QueryBuilder};
use crate::storage::error::{StorageError, StorageResult};
use arrow::array::{ArrayRef, BooleanArray};
use arrow::compute::filter_record_batch;
use arrow::datatypes::Field;
use regex::Regex;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Row-at-a-time evaluator bound to one batch
pub struct ExpressionEvaluator<'a> {
    batch: &'a RecordBatch,
    patterns: RefCell<HashMap<String, Regex>>,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(batch: &'a RecordBatch) -> Self {
        Self {
            batch,
            patterns: RefCell::new(HashMap::new()),
        }
    }

    /// Evaluate `expr` for one row
    pub fn evaluate(&self, expr: &ExpressionNode, row: usize) -> StorageResult<Value> {
        match expr {
            ExpressionNode::Column(name) => self.evaluate_column_ref(name, row),

            ExpressionNode::Value(value) => Ok(value.clone()),

            ExpressionNode::ValueSet(_) => Err(StorageError::Evaluation(
                "value set used outside of ISIN/ISNOTIN".to_string(),
            )),

            ExpressionNode::Absent => Ok(Value::Null),

            ExpressionNode::Compose { left, op, right } => match op {
                Opcode::IsIn | Opcode::IsNotIn => {
                    let needle = self.evaluate(left, row)?;
                    let found = self.evaluate_membership(&needle, right, row)?;
                    Ok(match (found, op) {
                        (None, _) => Value::Null,
                        (Some(found), Opcode::IsIn) => Value::Boolean(found),
                        (Some(found), _) => Value::Boolean(!found),
                    })
                }
                op if op.is_unary() => {
                    let operand = self.evaluate(left, row)?;
                    self.evaluate_unary_op(*op, operand)
                }
                op => {
                    let left_val = self.evaluate(left, row)?;
                    let right_val = self.evaluate(right, row)?;
                    self.evaluate_binary_op(*op, left_val, right_val)
                }
            },
        }
    }

    /// Selection mask for `predicate`; NULL rows are dropped
    pub fn filter_mask(&self, predicate: &ExpressionNode) -> StorageResult<BooleanArray> {
        (0..self.batch.num_rows())
            .map(|row| match self.evaluate(predicate, row)? {
                Value::Boolean(keep) => Ok(keep),
                Value::Null => Ok(false),
                other => Err(StorageError::Evaluation(format!(
                    "filter predicate {} produced non-boolean value {:?}",
                    predicate, other
                ))),
            })
            .collect::<StorageResult<Vec<bool>>>()
            .map(BooleanArray::from)
    }

    /// Evaluate `expr` for every row into a typed column
    pub fn evaluate_column(&self, expr: &ExpressionNode) -> StorageResult<ArrayRef> {
        let values = (0..self.batch.num_rows())
            .map(|row| self.evaluate(expr, row))
            .collect::<StorageResult<Vec<_>>>()?;
        let data_type = self.result_type(expr, &values);
        Ok(array_from_values(&data_type.to_arrow(), &values)?)
    }

    fn evaluate_column_ref(&self, name: &str, row: usize) -> StorageResult<Value> {
        let column = self
            .batch
            .column_by_name(name)
            .ok_or_else(|| StorageError::UnknownColumn(name.to_string()))?;
        Ok(value_at(column.as_ref(), row)?)
    }

    /// `Some(found)`, or `None` when the needle is NULL
    fn evaluate_membership(
        &self,
        needle: &Value,
        haystack: &ExpressionNode,
        row: usize,
    ) -> StorageResult<Option<bool>> {
        if needle.is_null() {
            return Ok(None);
        }
        let candidates = match haystack {
            ExpressionNode::ValueSet(values) => values.clone(),
            other => vec![self.evaluate(other, row)?],
        };
        Ok(Some(candidates.iter().any(|candidate| {
            needle.compare(candidate) == Some(Ordering::Equal)
        })))
    }

    fn evaluate_binary_op(&self, op: Opcode, left: Value, right: Value) -> StorageResult<Value> {
        // Three-valued logic; everything else propagates NULL
        if left.is_null() || right.is_null() {
            return Ok(match op {
                Opcode::And => match (&left, &right) {
                    (Value::Boolean(false), _) | (_, Value::Boolean(false)) => {
                        Value::Boolean(false)
                    }
                    _ => Value::Null,
                },
                Opcode::Or => match (&left, &right) {
                    (Value::Boolean(true), _) | (_, Value::Boolean(true)) => Value::Boolean(true),
                    _ => Value::Null,
                },
                _ => Value::Null,
            });
        }

        match op {
            Opcode::Add | Opcode::Sub | Opcode::Mul => self.arithmetic(op, left, right),

            Opcode::Div => match (left.as_f64(), right.as_f64()) {
                (Some(_), Some(divisor)) if divisor == 0.0 => Err(StorageError::Evaluation(
                    "division by zero".to_string(),
                )),
                (Some(dividend), Some(divisor)) => Ok(Value::Float64(dividend / divisor)),
                _ => Err(invalid_operands(op, &left, &right)),
            },

            Opcode::Eq => self.compare_values(op, left, right, |ord| ord == Ordering::Equal),
            Opcode::Ne => self.compare_values(op, left, right, |ord| ord != Ordering::Equal),
            Opcode::Lt => self.compare_values(op, left, right, |ord| ord == Ordering::Less),
            Opcode::Le => self.compare_values(op, left, right, |ord| ord != Ordering::Greater),
            Opcode::Gt => self.compare_values(op, left, right, |ord| ord == Ordering::Greater),
            Opcode::Ge => self.compare_values(op, left, right, |ord| ord != Ordering::Less),

            Opcode::And | Opcode::Or | Opcode::Xor => match (&left, &right) {
                (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(match op {
                    Opcode::And => *a && *b,
                    Opcode::Or => *a || *b,
                    _ => *a ^ *b,
                })),
                _ => Err(invalid_operands(op, &left, &right)),
            },

            Opcode::RegexMatch => match (&left, &right) {
                (Value::String(text), Value::String(pattern)) => {
                    Ok(Value::Boolean(self.regex_match(pattern, text)?))
                }
                _ => Err(invalid_operands(op, &left, &right)),
            },

            Opcode::IsIn
            | Opcode::IsNotIn
            | Opcode::Not
            | Opcode::Neg
            | Opcode::Abs
            | Opcode::IsNull
            | Opcode::NotNull => Err(StorageError::Evaluation(format!(
                "{} is not a binary operation",
                op
            ))),
        }
    }

    fn evaluate_unary_op(&self, op: Opcode, operand: Value) -> StorageResult<Value> {
        match op {
            Opcode::IsNull => Ok(Value::Boolean(operand.is_null())),
            Opcode::NotNull => Ok(Value::Boolean(!operand.is_null())),
            _ if operand.is_null() => Ok(Value::Null),
            Opcode::Not => match operand {
                Value::Boolean(b) => Ok(Value::Boolean(!b)),
                other => Err(invalid_operand(op, &other)),
            },
            Opcode::Neg => match operand {
                Value::Int64(n) => Ok(Value::Int64(n.wrapping_neg())),
                Value::Float64(f) => Ok(Value::Float64(-f)),
                other => Err(invalid_operand(op, &other)),
            },
            Opcode::Abs => match operand {
                Value::Int64(n) => Ok(Value::Int64(n.wrapping_abs())),
                Value::Float64(f) => Ok(Value::Float64(f.abs())),
                other => Err(invalid_operand(op, &other)),
            },
            _ => Err(StorageError::Evaluation(format!(
                "{} is not a unary operation",
                op
            ))),
        }
    }

    fn arithmetic(&self, op: Opcode, left: Value, right: Value) -> StorageResult<Value> {
        match (&left, &right) {
            (Value::Int64(a), Value::Int64(b)) => Ok(Value::Int64(match op {
                Opcode::Add => a.wrapping_add(*b),
                Opcode::Sub => a.wrapping_sub(*b),
                _ => a.wrapping_mul(*b),
            })),
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) => Ok(Value::Float64(match op {
                    Opcode::Add => a + b,
                    Opcode::Sub => a - b,
                    _ => a * b,
                })),
                _ => Err(invalid_operands(op, &left, &right)),
            },
        }
    }

    /// Compare two values and apply a comparison function
    fn compare_values<F>(&self, op: Opcode, left: Value, right: Value, cmp_fn: F) -> StorageResult<Value>
    where
        F: FnOnce(Ordering) -> bool,
    {
        match left.compare(&right) {
            Some(ordering) => Ok(Value::Boolean(cmp_fn(ordering))),
            None => Err(invalid_operands(op, &left, &right)),
        }
    }

    fn regex_match(&self, pattern: &str, text: &str) -> StorageResult<bool> {
        let mut patterns = self.patterns.borrow_mut();
        if !patterns.contains_key(pattern) {
            let regex = Regex::new(pattern).map_err(|e| {
                StorageError::Evaluation(format!("invalid regex '{}': {}", pattern, e))
            })?;
            patterns.insert(pattern.to_string(), regex);
        }
        Ok(patterns
            .get(pattern)
            .is_some_and(|regex| regex.is_match(text)))
    }

    /// Column type of a computed expression
    fn result_type(&self, expr: &ExpressionNode, values: &[Value]) -> DataType {
        let mut seen: Option<DataType> = None;
        for data_type in values.iter().filter_map(Value::data_type) {
            seen = match (seen, data_type) {
                (None, t) => Some(t),
                (Some(DataType::Int64), DataType::Float64) => Some(DataType::Float64),
                (Some(t), _) => Some(t),
            };
        }
        seen.unwrap_or_else(|| self.static_type(expr))
    }

    /// Best guess for an all-NULL result
    fn static_type(&self, expr: &ExpressionNode) -> DataType {
        match expr {
            ExpressionNode::Column(name) => self
                .batch
                .schema()
                .column_with_name(name)
                .and_then(|(_, field)| DataType::from_arrow(field.data_type()))
                .unwrap_or(DataType::Float64),
            ExpressionNode::Value(value) => value.data_type().unwrap_or(DataType::Float64),
            ExpressionNode::Compose { op, .. } if op.is_predicate() => DataType::Boolean,
            ExpressionNode::Compose { left, .. } => self.static_type(left),
            ExpressionNode::ValueSet(_) | ExpressionNode::Absent => DataType::Float64,
        }
    }
}

fn invalid_operands(op: Opcode, left: &Value, right: &Value) -> StorageError {
    StorageError::Evaluation(format!(
        "invalid operand types for {}: left={:?}, right={:?}",
        op,
        left.data_type(),
        right.data_type()
    ))
}

fn invalid_operand(op: Opcode, operand: &Value) -> StorageError {
    StorageError::Evaluation(format!(
        "invalid operand type for {}: {:?}",
        op,
        operand.data_type()
    ))
}

/// Apply every clause of `query` to `batch`, in order
pub fn apply_query(mut batch: RecordBatch, query: &QueryBuilder) -> StorageResult<RecordBatch> {
    for clause in query.clauses() {
        batch = match clause {
            Clause::Filter(predicate) => {
                let mask = ExpressionEvaluator::new(&batch).filter_mask(predicate)?;
                filter_record_batch(&batch, &mask)?
            }
            Clause::Project { name, expr } => {
                let column = ExpressionEvaluator::new(&batch).evaluate_column(expr)?;
                let field = Field::new(name.as_str(), column.data_type().clone(), true);
                with_column(&batch, field, column)?
            }
        };
    }
    Ok(batch)
}
