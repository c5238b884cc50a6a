//! sf-filter - run a Rhai record transform over NDJSON.
//!
//! # Usage
//!
//! ```bash
//! # Append "!" to every name
//! cat users.ndjson | sf-filter --schema id:long,name:string \
//!     --script 'record.name = record.name + "!"; record'
//!
//! # Script from a file, 500 records per page, counters on stderr
//! cat events.ndjson | sf-filter --schema id:long,at:timestamp \
//!     --script-file ./transform.rhai --page-size 500 --stats
//!
//! # Check that a script compiles
//! sf-filter --script-file ./transform.rhai --validate
//! ```

mod args;
mod output;
mod run;

use anyhow::Result;
use args::Cli;
use clap::Parser;
use sf_cli_common::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_level)?;

    run::run(cli).await
}
