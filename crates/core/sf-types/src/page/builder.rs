//! Output page buffer.

use crate::cell::Cell;
use crate::schema::{Column, ColumnType, SchemaRef};
use arrow::array::{
    ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder,
    TimestampMicrosecondBuilder, TimestampMillisecondBuilder, TimestampNanosecondBuilder,
    TimestampSecondBuilder,
};
use arrow::datatypes::{SchemaRef as ArrowSchemaRef, TimeUnit};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use chrono::{DateTime, Utc};
use sf_error::{PageError, Result};
use std::sync::Arc;

/// Accumulates whole records and seals them into a [`RecordBatch`].
///
/// Records are appended atomically: every cell of a record is checked before
/// any column builder is touched, so a rejected record leaves the buffer as
/// it was.
pub struct PageBuilder {
    schema: SchemaRef,
    arrow_schema: ArrowSchemaRef,
    columns: Vec<ColumnBuilder>,
    rows: usize,
}

impl std::fmt::Debug for PageBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageBuilder")
            .field("columns", &self.schema.len())
            .field("rows", &self.rows)
            .finish_non_exhaustive()
    }
}

impl PageBuilder {
    pub fn new(schema: SchemaRef) -> Self {
        let columns = schema
            .columns()
            .iter()
            .map(ColumnBuilder::new)
            .collect();

        Self {
            arrow_schema: schema.to_arrow(),
            schema,
            columns,
            rows: 0,
        }
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Appends one record given as cells in schema order.
    ///
    /// # Errors
    ///
    /// Returns a [`PageError`] if the cell count differs from the column
    /// count, a cell does not fit its column, or a timestamp cannot be
    /// represented in the column's unit.
    pub fn add_record(&mut self, cells: Vec<Cell>) -> Result<()> {
        if cells.len() != self.schema.len() {
            return Err(PageError::SchemaMismatch(format!(
                "record has {} cells, schema has {} columns",
                cells.len(),
                self.schema.len()
            ))
            .into());
        }

        for (column, cell) in self.schema.columns().iter().zip(&cells) {
            check_cell(column, cell)?;
        }

        for ((builder, column), cell) in self
            .columns
            .iter_mut()
            .zip(self.schema.columns())
            .zip(cells)
        {
            builder.append(column, cell)?;
        }

        self.rows += 1;
        Ok(())
    }

    /// Number of buffered records.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Seals the buffered records into a page and resets the buffer.
    pub fn build(&mut self) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = self.columns.iter_mut().map(ColumnBuilder::finish).collect();
        let options = RecordBatchOptions::new().with_row_count(Some(self.rows));
        self.rows = 0;

        RecordBatch::try_new_with_options(self.arrow_schema.clone(), columns, &options)
            .map_err(|e| PageError::Build(e.to_string()).into())
    }

    /// Drops all buffered records.
    pub fn discard(&mut self) {
        for builder in &mut self.columns {
            builder.finish();
        }
        self.rows = 0;
    }
}

fn check_cell(column: &Column, cell: &Cell) -> Result<()> {
    if !cell.fits(column.column_type()) {
        return Err(PageError::InvalidValue {
            column: column.name().to_string(),
            reason: format!("{cell:?} does not fit {}", column.column_type()),
        }
        .into());
    }

    if let (Cell::Timestamp(ts), ColumnType::Timestamp(unit)) = (cell, column.column_type()) {
        timestamp_raw(column, unit, ts)?;
    }

    Ok(())
}

/// Converts an instant to the raw integer stored for `unit`.
fn timestamp_raw(column: &Column, unit: TimeUnit, ts: &DateTime<Utc>) -> Result<i64> {
    let raw = match unit {
        TimeUnit::Second => Some(ts.timestamp()),
        TimeUnit::Millisecond => Some(ts.timestamp_millis()),
        TimeUnit::Microsecond => Some(ts.timestamp_micros()),
        TimeUnit::Nanosecond => ts.timestamp_nanos_opt(),
    };

    raw.ok_or_else(|| {
        PageError::InvalidValue {
            column: column.name().to_string(),
            reason: format!("{ts} is not representable as {}", column.column_type()),
        }
        .into()
    })
}

/// Arrow builder for one output column.
enum ColumnBuilder {
    String(StringBuilder),
    Int64(Int64Builder),
    Float64(Float64Builder),
    Boolean(BooleanBuilder),
    TimestampSecond(TimestampSecondBuilder),
    TimestampMillisecond(TimestampMillisecondBuilder),
    TimestampMicrosecond(TimestampMicrosecondBuilder),
    TimestampNanosecond(TimestampNanosecondBuilder),
}

impl ColumnBuilder {
    fn new(column: &Column) -> Self {
        let timezone = column.timezone().cloned();
        match column.column_type() {
            ColumnType::String => Self::String(StringBuilder::new()),
            ColumnType::Int64 => Self::Int64(Int64Builder::new()),
            ColumnType::Float64 => Self::Float64(Float64Builder::new()),
            ColumnType::Boolean => Self::Boolean(BooleanBuilder::new()),
            ColumnType::Timestamp(TimeUnit::Second) => {
                Self::TimestampSecond(TimestampSecondBuilder::new().with_timezone_opt(timezone))
            }
            ColumnType::Timestamp(TimeUnit::Millisecond) => {
                Self::TimestampMillisecond(TimestampMillisecondBuilder::new().with_timezone_opt(timezone))
            }
            ColumnType::Timestamp(TimeUnit::Microsecond) => {
                Self::TimestampMicrosecond(TimestampMicrosecondBuilder::new().with_timezone_opt(timezone))
            }
            ColumnType::Timestamp(TimeUnit::Nanosecond) => {
                Self::TimestampNanosecond(TimestampNanosecondBuilder::new().with_timezone_opt(timezone))
            }
        }
    }

    fn append(&mut self, column: &Column, cell: Cell) -> Result<()> {
        match (self, cell) {
            (Self::String(b), Cell::Null) => b.append_null(),
            (Self::Int64(b), Cell::Null) => b.append_null(),
            (Self::Float64(b), Cell::Null) => b.append_null(),
            (Self::Boolean(b), Cell::Null) => b.append_null(),
            (Self::TimestampSecond(b), Cell::Null) => b.append_null(),
            (Self::TimestampMillisecond(b), Cell::Null) => b.append_null(),
            (Self::TimestampMicrosecond(b), Cell::Null) => b.append_null(),
            (Self::TimestampNanosecond(b), Cell::Null) => b.append_null(),
            (Self::String(b), Cell::String(v)) => b.append_value(v),
            (Self::Int64(b), Cell::Int64(v)) => b.append_value(v),
            (Self::Float64(b), Cell::Float64(v)) => b.append_value(v),
            (Self::Boolean(b), Cell::Boolean(v)) => b.append_value(v),
            (Self::TimestampSecond(b), Cell::Timestamp(ts)) => {
                b.append_value(timestamp_raw(column, TimeUnit::Second, &ts)?)
            }
            (Self::TimestampMillisecond(b), Cell::Timestamp(ts)) => {
                b.append_value(timestamp_raw(column, TimeUnit::Millisecond, &ts)?)
            }
            (Self::TimestampMicrosecond(b), Cell::Timestamp(ts)) => {
                b.append_value(timestamp_raw(column, TimeUnit::Microsecond, &ts)?)
            }
            (Self::TimestampNanosecond(b), Cell::Timestamp(ts)) => {
                b.append_value(timestamp_raw(column, TimeUnit::Nanosecond, &ts)?)
            }
            (_, cell) => {
                return Err(PageError::InvalidValue {
                    column: column.name().to_string(),
                    reason: format!("{cell:?} does not fit {}", column.column_type()),
                }
                .into());
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> ArrayRef {
        match self {
            Self::String(b) => Arc::new(b.finish()),
            Self::Int64(b) => Arc::new(b.finish()),
            Self::Float64(b) => Arc::new(b.finish()),
            Self::Boolean(b) => Arc::new(b.finish()),
            Self::TimestampSecond(b) => Arc::new(b.finish()),
            Self::TimestampMillisecond(b) => Arc::new(b.finish()),
            Self::TimestampMicrosecond(b) => Arc::new(b.finish()),
            Self::TimestampNanosecond(b) => Arc::new(b.finish()),
        }
    }
}
