//! Cursor over the records of an input page.

use crate::cell::Cell;
use crate::schema::{Column, ColumnType, SchemaRef};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray,
};
use arrow::datatypes::TimeUnit;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use sf_error::{PageError, Result};
use std::sync::Arc;

/// Reads typed cells record by record from pages sharing one schema.
///
/// ```ignore
/// reader.set_page(page)?;
/// while reader.next_record() {
///     let cell = reader.cell(column)?;
/// }
/// ```
#[derive(Debug)]
pub struct PageReader {
    schema: SchemaRef,
    page: Option<Arc<RecordBatch>>,
    /// Number of records advanced past; the current row is `position - 1`.
    position: usize,
}

impl PageReader {
    pub fn new(schema: SchemaRef) -> Self {
        Self {
            schema,
            page: None,
            position: 0,
        }
    }

    /// Returns the schema pages are validated against.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Points the reader at a new page and rewinds the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::SchemaMismatch`] if the page's column count or
    /// Arrow types differ from the reader's schema.
    pub fn set_page(&mut self, page: Arc<RecordBatch>) -> Result<()> {
        if page.num_columns() != self.schema.len() {
            return Err(PageError::SchemaMismatch(format!(
                "expected {} columns, page has {}",
                self.schema.len(),
                page.num_columns()
            ))
            .into());
        }

        for column in self.schema.columns() {
            let data_type = page.column(column.index()).data_type();
            if !column.column_type().accepts(data_type) {
                return Err(PageError::SchemaMismatch(format!(
                    "column '{}' is {}, expected {}",
                    column.name(),
                    data_type,
                    column.column_type()
                ))
                .into());
            }
        }

        self.page = Some(page);
        self.position = 0;
        Ok(())
    }

    /// Advances to the next record. Returns false once the page is exhausted.
    pub fn next_record(&mut self) -> bool {
        match &self.page {
            Some(page) if self.position < page.num_rows() => {
                self.position += 1;
                true
            }
            _ => false,
        }
    }

    /// Index of the current record within the page.
    pub fn row(&self) -> Option<usize> {
        self.page.as_ref()?;
        self.position.checked_sub(1)
    }

    /// Number of records in the current page.
    pub fn num_rows(&self) -> usize {
        self.page.as_ref().map_or(0, |p| p.num_rows())
    }

    pub fn is_null(&self, column: &Column) -> Result<bool> {
        let (array, row) = self.current(column)?;
        Ok(array.is_null(row))
    }

    /// Reads the current record's cell for `column`.
    pub fn cell(&self, column: &Column) -> Result<Cell> {
        let (array, row) = self.current(column)?;
        if array.is_null(row) {
            return Ok(Cell::Null);
        }

        let cell = match column.column_type() {
            ColumnType::String => {
                Cell::String(downcast::<StringArray>(array, column)?.value(row).to_string())
            }
            ColumnType::Int64 => Cell::Int64(downcast::<Int64Array>(array, column)?.value(row)),
            ColumnType::Float64 => {
                Cell::Float64(downcast::<Float64Array>(array, column)?.value(row))
            }
            ColumnType::Boolean => {
                Cell::Boolean(downcast::<BooleanArray>(array, column)?.value(row))
            }
            ColumnType::Timestamp(TimeUnit::Second) => {
                let secs = downcast::<TimestampSecondArray>(array, column)?.value(row);
                timestamp(column, DateTime::from_timestamp(secs, 0))?
            }
            ColumnType::Timestamp(TimeUnit::Millisecond) => {
                let millis = downcast::<TimestampMillisecondArray>(array, column)?.value(row);
                timestamp(column, DateTime::from_timestamp_millis(millis))?
            }
            ColumnType::Timestamp(TimeUnit::Microsecond) => {
                let micros = downcast::<TimestampMicrosecondArray>(array, column)?.value(row);
                timestamp(column, DateTime::from_timestamp_micros(micros))?
            }
            ColumnType::Timestamp(TimeUnit::Nanosecond) => {
                let nanos = downcast::<TimestampNanosecondArray>(array, column)?.value(row);
                Cell::Timestamp(DateTime::from_timestamp_nanos(nanos))
            }
        };

        Ok(cell)
    }

    fn current(&self, column: &Column) -> Result<(&ArrayRef, usize)> {
        let page = self.page.as_ref().ok_or_else(|| no_record(column))?;
        let row = self.position.checked_sub(1).ok_or_else(|| no_record(column))?;
        Ok((page.column(column.index()), row))
    }
}

fn no_record(column: &Column) -> sf_error::SfError {
    PageError::InvalidValue {
        column: column.name().to_string(),
        reason: "no current record".to_string(),
    }
    .into()
}

fn downcast<'a, T: Array + 'static>(array: &'a ArrayRef, column: &Column) -> Result<&'a T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        PageError::SchemaMismatch(format!(
            "column '{}' is {}, expected {}",
            column.name(),
            array.data_type(),
            column.column_type()
        ))
        .into()
    })
}

fn timestamp(column: &Column, value: Option<DateTime<Utc>>) -> Result<Cell> {
    value.map(Cell::Timestamp).ok_or_else(|| {
        PageError::InvalidValue {
            column: column.name().to_string(),
            reason: "timestamp out of range".to_string(),
        }
        .into()
    })
}
