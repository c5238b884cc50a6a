//! Core traits for the script filter stage.
//!
//! - [`PageOutput`] - Downstream consumer of sealed pages (add/finish/close)
//! - [`Evaluator`] - The user transformation as a construct-once callable

pub mod evaluator;
pub mod output;

pub use evaluator::{Evaluator, FnEvaluator, IdentityEvaluator};
pub use output::{MemoryOutput, PageOutput};
