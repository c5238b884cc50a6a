//! Evaluator trait: the user transformation as a callable.

use sf_error::Result;
use sf_types::GenericRecord;

/// A construct-once, call-many record transformation.
///
/// An evaluator is acquired when a filter instance opens and dropped when it
/// finishes or closes. It holds mutable interpreter state, so each filter
/// instance owns its own evaluator; parallel instances never share one.
///
/// Implementations must report every failure of the user logic as an
/// `Err` (normally [`TransformError::UserCode`](sf_error::TransformError::UserCode))
/// rather than panicking.
pub trait Evaluator: Send {
    /// Runs the user transformation on one generic record.
    fn invoke(&mut self, record: GenericRecord) -> Result<GenericRecord>;

    /// Returns the name of this evaluator for logging.
    fn name(&self) -> &str {
        "evaluator"
    }
}

/// Evaluator that returns every record unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityEvaluator;

impl Evaluator for IdentityEvaluator {
    fn invoke(&mut self, record: GenericRecord) -> Result<GenericRecord> {
        Ok(record)
    }

    fn name(&self) -> &str {
        "identity"
    }
}

/// Evaluator backed by a Rust closure.
///
/// Handy for hosts that want native transforms and for tests.
pub struct FnEvaluator<F> {
    func: F,
    name: String,
}

impl<F> FnEvaluator<F>
where
    F: FnMut(GenericRecord) -> Result<GenericRecord> + Send,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            name: "fn".to_string(),
        }
    }

    /// Sets the name of this evaluator.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F> Evaluator for FnEvaluator<F>
where
    F: FnMut(GenericRecord) -> Result<GenericRecord> + Send,
{
    fn invoke(&mut self, record: GenericRecord) -> Result<GenericRecord> {
        (self.func)(record)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
