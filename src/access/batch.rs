//! Arrow batch helpers: scalar access to cells, typed columns built from
//! scalar values, and the batch edits the read pipeline needs.

use crate::access::value::{DataType, Value};
use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray,
    TimestampNanosecondArray,
};
use arrow::datatypes::{
    DataType as ArrowType, Field, Float64Type, Int64Type, Schema, SchemaRef, TimeUnit,
    TimestampNanosecondType,
};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

pub type BatchResult<T> = Result<T, ArrowError>;

/// Nullable field of a logical type
pub fn field(name: &str, data_type: DataType) -> Field {
    Field::new(name, data_type.to_arrow(), true)
}

/// Schema of nullable fields, in order
pub fn schema_of(fields: &[(&str, DataType)]) -> SchemaRef {
    Arc::new(Schema::new(
        fields
            .iter()
            .map(|(name, data_type)| field(name, *data_type))
            .collect::<Vec<_>>(),
    ))
}

pub fn column_names(schema: &Schema) -> Vec<&str> {
    schema.fields().iter().map(|f| f.name().as_str()).collect()
}

/// Read one cell as a scalar
pub fn value_at(array: &dyn Array, row: usize) -> BatchResult<Value> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match array.data_type() {
        ArrowType::Boolean => Value::Boolean(array.as_boolean().value(row)),
        ArrowType::Int64 => Value::Int64(array.as_primitive::<Int64Type>().value(row)),
        ArrowType::Float64 => Value::Float64(array.as_primitive::<Float64Type>().value(row)),
        ArrowType::Utf8 => Value::String(array.as_string::<i32>().value(row).to_string()),
        ArrowType::Timestamp(TimeUnit::Nanosecond, _) => {
            Value::Timestamp(array.as_primitive::<TimestampNanosecondType>().value(row))
        }
        other => {
            return Err(ArrowError::InvalidArgumentError(format!(
                "unsupported column type {}",
                other
            )))
        }
    };
    Ok(value)
}

/// Build a column of `data_type`; integers widen into float columns
pub fn array_from_values(data_type: &ArrowType, values: &[Value]) -> BatchResult<ArrayRef> {
    let mismatch = |value: &Value| {
        ArrowError::InvalidArgumentError(format!(
            "value {:?} does not fit a {} column",
            value, data_type
        ))
    };

    let array: ArrayRef = match data_type {
        ArrowType::Boolean => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Boolean(b) => Ok(Some(*b)),
                    other => Err(mismatch(other)),
                })
                .collect::<BatchResult<BooleanArray>>()?,
        ),
        ArrowType::Int64 => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Int64(i) => Ok(Some(*i)),
                    other => Err(mismatch(other)),
                })
                .collect::<BatchResult<Int64Array>>()?,
        ),
        ArrowType::Float64 => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Float64(f) => Ok(Some(*f)),
                    Value::Int64(i) => Ok(Some(*i as f64)),
                    other => Err(mismatch(other)),
                })
                .collect::<BatchResult<Float64Array>>()?,
        ),
        ArrowType::Utf8 => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::String(s) => Ok(Some(s.as_str())),
                    other => Err(mismatch(other)),
                })
                .collect::<BatchResult<StringArray>>()?,
        ),
        ArrowType::Timestamp(TimeUnit::Nanosecond, tz) => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Null => Ok(None),
                    Value::Timestamp(ns) => Ok(Some(*ns)),
                    other => Err(mismatch(other)),
                })
                .collect::<BatchResult<TimestampNanosecondArray>>()?
                .with_timezone_opt(tz.clone()),
        ),
        other => {
            return Err(ArrowError::InvalidArgumentError(format!(
                "unsupported column type {}",
                other
            )))
        }
    };
    Ok(array)
}

/// Build a batch from row-major values
pub fn batch_from_rows(schema: SchemaRef, rows: &[Vec<Value>]) -> BatchResult<RecordBatch> {
    if let Some(ragged) = rows.iter().find(|row| row.len() != schema.fields().len()) {
        return Err(ArrowError::InvalidArgumentError(format!(
            "row has {} values, schema has {} fields",
            ragged.len(),
            schema.fields().len()
        )));
    }
    let columns = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let values: Vec<Value> = rows.iter().map(|row| row[index].clone()).collect();
            array_from_values(field.data_type(), &values)
        })
        .collect::<BatchResult<Vec<_>>>()?;
    RecordBatch::try_new(schema, columns)
}

/// Row-major scalar view of a batch
pub fn batch_rows(batch: &RecordBatch) -> BatchResult<Vec<Vec<Value>>> {
    (0..batch.num_rows())
        .map(|row| {
            batch
                .columns()
                .iter()
                .map(|column| value_at(column.as_ref(), row))
                .collect::<BatchResult<Vec<_>>>()
        })
        .collect()
}

/// Every value of the column `name`, or `None` if there is no such column
pub fn column_values(batch: &RecordBatch, name: &str) -> BatchResult<Option<Vec<Value>>> {
    let Some(column) = batch.column_by_name(name) else {
        return Ok(None);
    };
    (0..column.len())
        .map(|row| value_at(column.as_ref(), row))
        .collect::<BatchResult<Vec<_>>>()
        .map(Some)
}

/// Rows `[start, end)`, clamped to the batch length
pub fn slice_rows(batch: &RecordBatch, start: usize, end: usize) -> RecordBatch {
    let start = start.min(batch.num_rows());
    let end = end.clamp(start, batch.num_rows());
    batch.slice(start, end - start)
}

/// Append `column` under `field`, replacing any column of the same name
pub fn with_column(batch: &RecordBatch, field: Field, column: ArrayRef) -> BatchResult<RecordBatch> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(schema.fields().len() + 1);
    let mut columns = Vec::with_capacity(schema.fields().len() + 1);
    for (existing, data) in schema.fields().iter().zip(batch.columns()) {
        if existing.name() != field.name() {
            fields.push(Field::clone(existing));
            columns.push(data.clone());
        }
    }
    fields.push(field);
    columns.push(column);
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
}
