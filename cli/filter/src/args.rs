//! Command-line arguments for sf-filter.

use clap::Parser;
use sf_transform::{EngineLimits, TransformConfig};
use std::path::PathBuf;

pub use sf_cli_common::LogLevel;

/// Run a Rhai record transform over NDJSON.
///
/// Reads one JSON object per line from stdin, groups lines into pages of the
/// declared schema, passes every record through the script and writes the
/// results to stdout as JSON Lines. The script body runs as
/// `fn process(record) { ... }` and must evaluate to the record map.
///
/// ## Examples
///
///   cat users.ndjson | sf-filter --schema id:long,name:string \
///       --script 'record.name = record.name + "!"; record'
///
///   sf-filter --script-file ./transform.rhai --validate
#[derive(Parser, Debug)]
#[command(name = "sf-filter")]
#[command(version, about, verbatim_doc_comment)]
pub struct Cli {
    /// Inline Rhai script
    #[arg(short = 's', long, conflicts_with = "script_file")]
    pub script: Option<String>,

    /// Path to a Rhai script file
    #[arg(short = 'S', long, env = "SF_SCRIPT_FILE")]
    pub script_file: Option<PathBuf>,

    /// Input schema as comma-separated name:type pairs
    /// (types: string, long, double, boolean, timestamp, timestamp[s|ms|us|ns])
    #[arg(long, env = "SF_SCHEMA", required_unless_present = "validate")]
    pub schema: Option<String>,

    /// Records per page
    #[arg(long, default_value = "1024", value_parser = parse_positive_usize)]
    pub page_size: usize,

    /// Process only the first N records
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Operation budget per record (unlimited when omitted)
    #[arg(long)]
    pub max_operations: Option<u64>,

    /// Compile the script and exit
    #[arg(long)]
    pub validate: bool,

    /// Print filter statistics to stderr
    #[arg(long)]
    pub stats: bool,

    /// Log level
    #[arg(short = 'l', long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,
}

impl Cli {
    /// Builds the transform configuration from the script arguments.
    pub fn transform_config(&self) -> TransformConfig {
        let limits = EngineLimits {
            max_operations: self.max_operations,
            ..EngineLimits::default()
        };

        TransformConfig {
            script: self.script.clone(),
            script_file: self.script_file.clone(),
            limits,
        }
    }
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value < 1 {
        return Err(format!("{value} is not in 1.."));
    }
    Ok(value)
}
