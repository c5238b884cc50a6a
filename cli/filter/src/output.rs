//! JSON Lines page output.

use arrow::record_batch::RecordBatch;
use chrono::SecondsFormat;
use serde_json::{Map, Number, Value as Json};
use sf_error::{PageError, Result};
use sf_traits::PageOutput;
use sf_types::{Cell, PageReader, SchemaRef};
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

/// Writes every record of every page as one JSON object per line.
///
/// Keys follow schema order. Timestamps are written as RFC 3339 strings and
/// non-finite floats as `null`.
pub struct JsonLinesOutput<W> {
    reader: PageReader,
    writer: W,
    lines: u64,
}

impl<W: Write + Send> JsonLinesOutput<W> {
    pub fn new(schema: SchemaRef, writer: W) -> Self {
        Self {
            reader: PageReader::new(schema),
            writer,
            lines: 0,
        }
    }

    #[cfg(test)]
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    fn write_record(&mut self) -> Result<()> {
        let schema = self.reader.schema().clone();
        let mut object = Map::with_capacity(schema.len());
        for column in schema.columns() {
            let cell = self.reader.cell(column)?;
            object.insert(column.name().to_string(), cell_to_json(cell));
        }

        serde_json::to_writer(&mut self.writer, &object).map_err(output_error)?;
        self.writer.write_all(b"\n").map_err(output_error)?;
        self.lines += 1;
        Ok(())
    }
}

impl<W: Write + Send> PageOutput for JsonLinesOutput<W> {
    fn add(&mut self, page: Arc<RecordBatch>) -> Result<()> {
        self.reader.set_page(page)?;
        while self.reader.next_record() {
            self.write_record()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().map_err(output_error)?;
        debug!(lines = self.lines, "Finished writing output");
        Ok(())
    }

    fn close(&mut self) {
        if let Err(e) = self.writer.flush() {
            debug!(error = %e, "Flush on close failed");
        }
    }
}

fn cell_to_json(cell: Cell) -> Json {
    match cell {
        Cell::Null => Json::Null,
        Cell::String(s) => Json::String(s),
        Cell::Int64(i) => Json::Number(i.into()),
        Cell::Float64(f) => Number::from_f64(f).map_or(Json::Null, Json::Number),
        Cell::Boolean(b) => Json::Bool(b),
        Cell::Timestamp(ts) => Json::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
    }
}

fn output_error(e: impl std::fmt::Display) -> sf_error::SfError {
    PageError::Output(e.to_string()).into()
}
