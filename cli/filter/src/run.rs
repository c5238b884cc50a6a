//! Stdin -> ScriptFilter -> stdout.

use crate::args::Cli;
use crate::output::JsonLinesOutput;
use anyhow::{Context, Result};
use arrow::datatypes::SchemaRef as ArrowSchemaRef;
use arrow::json::ReaderBuilder;
use sf_cli_common::format_number;
use sf_error::classify_error;
use sf_traits::PageOutput;
use sf_transform::{FilterStats, RhaiEvaluator, ScriptFilter};
use sf_types::Schema;
use std::io::{BufRead, BufWriter};
use std::sync::Arc;
use tracing::{error, info};

/// Runs the filter as configured by `cli`.
pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.transform_config();

    if cli.validate {
        let script = config.load_script().await.context("Failed to load script")?;
        RhaiEvaluator::validate(&script).context("Script does not compile")?;
        eprintln!("Script syntax OK");
        return Ok(());
    }

    let spec = cli
        .schema
        .as_deref()
        .context("--schema is required unless --validate is given")?;
    let arrow_schema = Schema::parse(spec).context("Invalid --schema")?.to_arrow();

    let schema = ScriptFilter::transaction(&config, &arrow_schema)
        .await
        .context("Failed to set up script filter")?;

    let output = JsonLinesOutput::new(schema.clone(), BufWriter::new(std::io::stdout()));
    let mut filter = ScriptFilter::open(&config, schema, Box::new(output))
        .await
        .context("Failed to open script filter")?;

    info!(page_size = cli.page_size, limit = ?cli.limit, "Reading NDJSON from stdin");

    let stdin = std::io::stdin();
    let result = feed(
        &mut filter,
        stdin.lock(),
        arrow_schema,
        cli.page_size,
        cli.limit,
    )
    .and_then(|()| filter.finish().context("Failed to finish output"));
    filter.close();

    if cli.stats {
        print_stats(&filter.stats());
    }

    result
}

/// Reads NDJSON pages from `input` and hands them to `filter`.
pub fn feed<R: BufRead>(
    filter: &mut ScriptFilter,
    input: R,
    arrow_schema: ArrowSchemaRef,
    page_size: usize,
    limit: Option<usize>,
) -> Result<()> {
    let reader = ReaderBuilder::new(arrow_schema)
        .with_batch_size(page_size)
        .build(input)
        .context("Failed to create JSON reader")?;

    let mut remaining = limit.unwrap_or(usize::MAX);
    for (index, page) in reader.enumerate() {
        if remaining == 0 {
            break;
        }

        let page = page.with_context(|| format!("Failed to parse input page {index}"))?;
        let page = if page.num_rows() > remaining {
            page.slice(0, remaining)
        } else {
            page
        };
        remaining -= page.num_rows();

        filter.add(Arc::new(page)).map_err(|e| {
            error!(page = index, scope = ?classify_error(&e), error = %e, "Page failed");
            anyhow::Error::new(e).context(format!("Failed to process input page {index}"))
        })?;
    }

    Ok(())
}

fn print_stats(stats: &FilterStats) {
    eprintln!();
    eprintln!("Statistics:");
    eprintln!("  Pages in:     {}", format_number(stats.pages_in));
    eprintln!("  Pages out:    {}", format_number(stats.pages_out));
    eprintln!("  Records in:   {}", format_number(stats.records_in));
    eprintln!("  Records out:  {}", format_number(stats.records_out));
}
