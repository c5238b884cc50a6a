//! Typed input record -> generic record.

use crate::codec::decode;
use sf_error::Result;
use sf_types::{GenericRecord, PageReader, Schema};

/// Builds the generic form of the reader's current record.
///
/// The result has exactly one entry per column, in schema order, with
/// explicit [`Value::Null`](sf_types::Value::Null) entries for null cells.
pub fn marshal(reader: &PageReader, schema: &Schema) -> Result<GenericRecord> {
    let mut record = GenericRecord::with_capacity(schema.len());
    for column in schema.columns() {
        let cell = reader.cell(column)?;
        record.insert(column.name().to_string(), decode(cell));
    }
    Ok(record)
}
