//! Rhai-scripted record transform over Arrow pages.
//!
//! This crate provides [`ScriptFilter`], a pipeline stage that passes every
//! record of every page through a user-supplied Rhai script and re-encodes
//! the result against the output schema.
//!
//! # Per-record flow
//!
//! - **Marshal**: typed cells become a [`GenericRecord`](sf_types::GenericRecord)
//!   (timestamps as epoch milliseconds)
//! - **Invoke**: the script body runs as `fn process(record) { ... }` and must
//!   evaluate to a map
//! - **Unmarshal**: the map is encoded per output column; absent keys become
//!   null, int/float coerce into each other, anything else must match
//!
//! A failing record aborts its page; nothing of that page is emitted.
//!
//! # Example
//!
//! ```rust,ignore
//! use sf_transform::{ScriptFilter, TransformConfig};
//! use sf_traits::{MemoryOutput, PageOutput};
//!
//! let config = TransformConfig::with_script(r#"
//!     record.name = record.name + "!";
//!     record
//! "#);
//!
//! let schema = ScriptFilter::transaction(&config, &arrow_schema).await?;
//! let mut filter = ScriptFilter::open(&config, schema, Box::new(MemoryOutput::new())).await?;
//! filter.add(page)?;
//! filter.finish()?;
//! filter.close();
//! ```

mod builtin;
mod codec;
mod config;
mod conversion;
mod filter;
mod marshal;
mod rhai_evaluator;
mod unmarshal;

pub use codec::{decode, encode};
pub use config::{EngineLimits, TransformConfig};
pub use filter::{FilterStats, ScriptFilter};
pub use marshal::marshal;
pub use rhai_evaluator::RhaiEvaluator;
pub use unmarshal::{encode_record, unmarshal};
