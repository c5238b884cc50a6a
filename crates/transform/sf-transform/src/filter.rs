//! ScriptFilter - drives pages through the user script.

use crate::config::TransformConfig;
use crate::marshal::marshal;
use crate::rhai_evaluator::RhaiEvaluator;
use crate::unmarshal::unmarshal;
use arrow::datatypes::Schema as ArrowSchema;
use arrow::record_batch::RecordBatch;
use sf_error::{ProcessingStage, Result, SfError, TransformError};
use sf_traits::{Evaluator, PageOutput};
use sf_types::{PageBuilder, PageReader, Schema, SchemaRef};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Counters for one filter instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub pages_in: u64,
    pub pages_out: u64,
    pub records_in: u64,
    pub records_out: u64,
}

/// Row-by-row record transform stage.
///
/// Each record of an incoming page is marshalled into a generic record,
/// passed through the [`Evaluator`], and encoded back against the output
/// schema. Output order equals input order and every input record yields
/// exactly one output record.
///
/// A page is all-or-nothing: if any record fails, the records already
/// buffered for that page are discarded and nothing reaches the downstream
/// output. The host decides whether to continue with the next page (see
/// [`classify_error`](sf_error::classify_error)).
///
/// The filter owns its evaluator and releases it exactly once, on
/// [`finish`](PageOutput::finish), [`close`](PageOutput::close) or drop,
/// whichever comes first.
pub struct ScriptFilter {
    input_schema: SchemaRef,
    output_schema: SchemaRef,
    reader: PageReader,
    builder: PageBuilder,
    evaluator: Option<Box<dyn Evaluator>>,
    output: Box<dyn PageOutput>,
    stats: FilterStats,
}

impl std::fmt::Debug for ScriptFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptFilter")
            .field("evaluator", &self.evaluator.as_ref().map(|e| e.name()))
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl ScriptFilter {
    /// Validates the configuration against the input schema and returns the
    /// output schema.
    ///
    /// The script is compiled once here so a broken script fails before any
    /// page is read. The output schema equals the input schema.
    ///
    /// # Errors
    ///
    /// - [`TransformError::UnsupportedType`] if a column type is not supported
    /// - [`SfError::Config`] if not exactly one script source is configured
    /// - [`TransformError::Compilation`] if the script does not compile
    pub async fn transaction(
        config: &TransformConfig,
        input_schema: &ArrowSchema,
    ) -> Result<SchemaRef> {
        let schema = Arc::new(Schema::try_from_arrow(input_schema)?);
        RhaiEvaluator::from_file(config).await?;

        debug!(columns = schema.len(), "Script filter transaction ready");
        Ok(schema)
    }

    /// Opens a filter instance running the configured script.
    ///
    /// Each instance compiles its own evaluator; instances never share one.
    pub async fn open(
        config: &TransformConfig,
        input_schema: SchemaRef,
        output: Box<dyn PageOutput>,
    ) -> Result<Self> {
        let evaluator = RhaiEvaluator::from_file(config).await?;
        let output_schema = input_schema.clone();
        Ok(Self::with_evaluator(
            input_schema,
            output_schema,
            Box::new(evaluator),
            output,
        ))
    }

    /// Creates a filter around an already acquired evaluator.
    pub fn with_evaluator(
        input_schema: SchemaRef,
        output_schema: SchemaRef,
        evaluator: Box<dyn Evaluator>,
        output: Box<dyn PageOutput>,
    ) -> Self {
        debug!(evaluator = evaluator.name(), "Acquired evaluator");

        Self {
            reader: PageReader::new(input_schema.clone()),
            builder: PageBuilder::new(output_schema.clone()),
            input_schema,
            output_schema,
            evaluator: Some(evaluator),
            output,
            stats: FilterStats::default(),
        }
    }

    pub fn input_schema(&self) -> &SchemaRef {
        &self.input_schema
    }

    pub fn output_schema(&self) -> &SchemaRef {
        &self.output_schema
    }

    pub fn stats(&self) -> FilterStats {
        self.stats
    }

    /// Returns true once the evaluator has been released.
    pub fn is_released(&self) -> bool {
        self.evaluator.is_none()
    }

    /// Runs every record of the current page into the builder.
    fn process_page(&mut self) -> Result<()> {
        let evaluator = self.evaluator.as_mut().ok_or(TransformError::Released)?;

        while self.reader.next_record() {
            let row = self.reader.row().unwrap_or_default();
            self.stats.records_in += 1;

            let record = marshal(&self.reader, &self.input_schema)
                .map_err(|e| record_failed(row, ProcessingStage::Marshal, e))?;

            let result = evaluator
                .invoke(record)
                .map_err(|e| record_failed(row, ProcessingStage::Invoke, e))?;

            unmarshal(&result, &self.output_schema, &mut self.builder)
                .map_err(|e| record_failed(row, ProcessingStage::Unmarshal, e))?;
        }

        Ok(())
    }

    fn emit(&mut self) -> Result<()> {
        let page = self.builder.build()?;
        let num_rows = page.num_rows();

        self.output.add(Arc::new(page))?;

        self.stats.pages_out += 1;
        self.stats.records_out += num_rows as u64;
        debug!(num_rows, "Emitted page");
        Ok(())
    }

    /// Drops the evaluator if still held.
    fn release(&mut self) {
        if let Some(evaluator) = self.evaluator.take() {
            debug!(evaluator = evaluator.name(), "Released evaluator");
        }
    }
}

impl PageOutput for ScriptFilter {
    fn add(&mut self, page: Arc<RecordBatch>) -> Result<()> {
        if self.evaluator.is_none() {
            return Err(TransformError::Released.into());
        }

        self.stats.pages_in += 1;
        trace!(num_rows = page.num_rows(), "Processing page");

        self.reader.set_page(page)?;

        if let Err(e) = self.process_page() {
            self.builder.discard();
            return Err(e);
        }

        if self.builder.is_empty() {
            return Ok(());
        }

        if let Err(e) = self.emit() {
            self.builder.discard();
            warn!(stage = %ProcessingStage::Emit, error = %e, "Failed to emit page");
            return Err(e);
        }

        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.release();
        self.output.finish()
    }

    fn close(&mut self) {
        self.release();
        self.output.close();
    }
}

impl Drop for ScriptFilter {
    fn drop(&mut self) {
        self.release();
    }
}

fn record_failed(row: usize, stage: ProcessingStage, error: SfError) -> SfError {
    warn!(row, stage = %stage, error = %error, "Record failed, aborting page");
    error
}
