//! Single-cell conversion between typed cells and generic values.
//!
//! Decoding is total: every typed cell has a generic form. Encoding is
//! partial: it allows int/float widening and narrowing (script numerals do
//! not reliably keep that distinction) and rejects everything else.

use chrono::DateTime;
use sf_error::{Result, TransformError};
use sf_types::{Cell, Column, ColumnType, Value};

/// Converts a typed cell into its generic value.
///
/// Timestamps become epoch milliseconds. Sub-millisecond precision is
/// discarded, flooring toward negative infinity.
pub fn decode(cell: Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::String(s) => Value::Str(s),
        Cell::Int64(i) => Value::Int(i),
        Cell::Float64(f) => Value::Float(f),
        Cell::Boolean(b) => Value::Bool(b),
        Cell::Timestamp(ts) => Value::Int(ts.timestamp_millis()),
    }
}

/// Converts a generic value into a typed cell for `column`.
///
/// Null encodes to a null cell for every column type. A float written to a
/// string column uses the shortest text that parses back to the same value
/// and always reads as a float: `3.0`, `0.1`, `1e300`, `NaN`, `inf`.
///
/// # Errors
///
/// Returns [`TransformError::TypeMismatch`] naming the column when the value
/// kind cannot be stored in the column's type.
pub fn encode(column: &Column, value: &Value) -> Result<Cell> {
    if value.is_null() {
        return Ok(Cell::Null);
    }

    let cell = match column.column_type() {
        ColumnType::String => match value {
            Value::Str(s) => Cell::String(s.clone()),
            Value::Int(i) => Cell::String(i.to_string()),
            Value::Float(f) => Cell::String(format!("{f:?}")),
            Value::Bool(b) => Cell::String(b.to_string()),
            _ => return Err(mismatch(column, value)),
        },
        ColumnType::Int64 => match value {
            Value::Int(i) => Cell::Int64(*i),
            Value::Float(f) => Cell::Int64(truncate(column, value, *f)?),
            _ => return Err(mismatch(column, value)),
        },
        ColumnType::Float64 => match value {
            Value::Int(i) => Cell::Float64(*i as f64),
            Value::Float(f) => Cell::Float64(*f),
            _ => return Err(mismatch(column, value)),
        },
        ColumnType::Boolean => match value {
            Value::Bool(b) => Cell::Boolean(*b),
            _ => return Err(mismatch(column, value)),
        },
        ColumnType::Timestamp(_) => {
            let millis = match value {
                Value::Int(i) => *i,
                Value::Float(f) => truncate(column, value, *f)?,
                _ => return Err(mismatch(column, value)),
            };
            let ts = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                TransformError::TypeMismatch {
                    column: column.name().to_string(),
                    expected: format!("{} within range", column.column_type()),
                    actual: format!("{millis} ms"),
                }
            })?;
            Cell::Timestamp(ts)
        }
    };

    Ok(cell)
}

/// Truncates toward zero. NaN, infinities and values outside i64 fail.
fn truncate(column: &Column, value: &Value, f: f64) -> Result<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    let t = f.trunc();
    if t.is_finite() && t >= -LIMIT && t < LIMIT {
        Ok(t as i64)
    } else {
        Err(mismatch(column, value))
    }
}

fn mismatch(column: &Column, value: &Value) -> sf_error::SfError {
    TransformError::TypeMismatch {
        column: column.name().to_string(),
        expected: column.column_type().to_string(),
        actual: match value {
            Value::Float(f) => format!("float {f}"),
            other => other.type_name().to_string(),
        },
    }
    .into()
}
