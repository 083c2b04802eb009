//! Arrow IPC stream encoding for persisted batches.
//!
//! Also usable as a serde `with` module so a `RecordBatch` field can live
//! inside bincode-encoded structs.

use crate::access::batch::BatchResult;
use arrow::compute::concat_batches;
use arrow::ipc::reader::StreamReader;
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn encode(batch: &RecordBatch) -> BatchResult<Vec<u8>> {
    let mut writer = StreamWriter::try_new(Vec::new(), &batch.schema())?;
    writer.write(batch)?;
    writer.finish()?;
    writer.into_inner()
}

/// Decode a stream into one batch; an empty stream keeps its schema
pub fn decode(bytes: &[u8]) -> BatchResult<RecordBatch> {
    let reader = StreamReader::try_new(bytes, None)?;
    let schema = reader.schema();
    let batches = reader.collect::<BatchResult<Vec<_>>>()?;
    concat_batches(&schema, &batches)
}

pub fn serialize<S: Serializer>(batch: &RecordBatch, serializer: S) -> Result<S::Ok, S::Error> {
    encode(batch)
        .map_err(serde::ser::Error::custom)?
        .serialize(serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RecordBatch, D::Error> {
    let bytes = Vec::<u8>::deserialize(deserializer)?;
    decode(&bytes).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::batch::{batch_from_rows, batch_rows, schema_of};
    use crate::access::{DataType, Value};
    use anyhow::Result;

    #[test]
    fn test_encode_decode() -> Result<()> {
        let schema = schema_of(&[("x", DataType::Float64), ("ts", DataType::Timestamp)]);
        let batch = batch_from_rows(
            schema,
            &[
                vec![Value::Float64(f64::NAN), Value::Timestamp(7)],
                vec![Value::Null, Value::Null],
            ],
        )?;
        let decoded = decode(&encode(&batch)?)?;
        assert_eq!(decoded.schema(), batch.schema());
        assert_eq!(batch_rows(&decoded)?[1], vec![Value::Null, Value::Null]);
        assert_eq!(decoded.num_rows(), 2);
        Ok(())
    }

    #[test]
    fn test_empty_batch_keeps_schema() -> Result<()> {
        let batch = RecordBatch::new_empty(schema_of(&[("x", DataType::Int64)]));
        let decoded = decode(&encode(&batch)?)?;
        assert_eq!(decoded.num_rows(), 0);
        assert_eq!(decoded.schema(), batch.schema());
        Ok(())
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(decode(b"not an arrow stream").is_err());
    }
}
