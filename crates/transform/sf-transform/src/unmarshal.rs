//! Generic result record -> typed output record.

use crate::codec::encode;
use sf_error::Result;
use sf_types::{Cell, GenericRecord, PageBuilder, Schema};
use tracing::{trace, Level};

/// Encodes `result` against `schema` and appends it to `builder`.
///
/// A column missing from `result` is written as null, exactly like an
/// explicit null. This also nulls any column the script forgot to echo back.
/// Keys that are not columns of `schema` are ignored.
///
/// Nothing is appended if any column fails to encode.
pub fn unmarshal(result: &GenericRecord, schema: &Schema, builder: &mut PageBuilder) -> Result<()> {
    let cells = encode_record(result, schema)?;

    if tracing::enabled!(Level::TRACE) {
        let ignored: Vec<&str> = ignored_keys(result, schema).collect();
        if !ignored.is_empty() {
            trace!(?ignored, "Ignoring result keys outside the output schema");
        }
    }

    builder.add_record(cells)
}

fn ignored_keys<'a>(
    result: &'a GenericRecord,
    schema: &'a Schema,
) -> impl Iterator<Item = &'a str> + 'a {
    result
        .keys()
        .map(String::as_str)
        .filter(|k| !schema.contains(k))
}

/// Encodes `result` into one cell per column of `schema`.
pub fn encode_record(result: &GenericRecord, schema: &Schema) -> Result<Vec<Cell>> {
    schema
        .columns()
        .iter()
        .map(|column| match result.get(column.name()) {
            None => Ok(Cell::Null),
            Some(value) => encode(column, value),
        })
        .collect()
}
