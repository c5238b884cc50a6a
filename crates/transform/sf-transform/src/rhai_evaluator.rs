//! RhaiEvaluator - the user script as an [`Evaluator`].

use crate::builtin::register_builtin_functions;
use crate::config::{EngineLimits, TransformConfig};
use crate::conversion::{dynamic_to_record, record_to_dynamic};
use rhai::{Dynamic, Engine, OptimizationLevel, Scope, AST};
use sf_error::{Result, TransformError};
use sf_traits::Evaluator;
use sf_types::GenericRecord;
use tracing::{debug, info};

/// Name of the function the user source is wrapped into.
const ENTRY_POINT: &str = "process";

/// Evaluator that runs a compiled Rhai script against each record.
///
/// The user source is the body of a one-parameter function:
///
/// ```text
/// fn process(record) {
///     <source>
/// }
/// ```
///
/// so the script sees the current record as `record` and must evaluate to
/// the result map. Compilation happens once; each invocation only calls the
/// compiled function.
pub struct RhaiEvaluator {
    /// Pre-compiled AST holding the wrapped function.
    ast: AST,

    /// Engine with limits and helper functions registered.
    engine: Engine,

    scope: Scope<'static>,

    /// Evaluator name for logging.
    name: String,
}

impl std::fmt::Debug for RhaiEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RhaiEvaluator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl RhaiEvaluator {
    /// Compiles `script` under the given limits.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Compilation`] if the wrapped source does not
    /// compile.
    pub fn new(script: &str, limits: &EngineLimits) -> Result<Self> {
        let engine = create_engine(limits);

        let ast = engine
            .compile(wrap_source(script))
            .map_err(|e| TransformError::Compilation(e.to_string()))?;

        debug!(
            max_operations = ?limits.max_operations,
            "Created RhaiEvaluator"
        );

        Ok(Self {
            ast,
            engine,
            scope: Scope::new(),
            name: "rhai".to_string(),
        })
    }

    /// Creates an evaluator from an inline-script configuration.
    pub fn from_config(config: &TransformConfig) -> Result<Self> {
        Self::new(config.inline_script()?, &config.limits)
    }

    /// Creates an evaluator, reading the script file if that is the source.
    pub async fn from_file(config: &TransformConfig) -> Result<Self> {
        let script = config.load_script().await?;
        Self::new(&script, &config.limits)
    }

    /// Checks that `script` compiles, without keeping the evaluator.
    pub fn validate(script: &str) -> Result<()> {
        Self::new(script, &EngineLimits::default()).map(|_| ())
    }

    /// Sets the evaluator name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Evaluator for RhaiEvaluator {
    fn invoke(&mut self, record: GenericRecord) -> Result<GenericRecord> {
        self.scope.clear();

        let result = self
            .engine
            .call_fn::<Dynamic>(
                &mut self.scope,
                &self.ast,
                ENTRY_POINT,
                (record_to_dynamic(record),),
            )
            .map_err(|e| TransformError::UserCode(e.to_string()))?;

        dynamic_to_record(result)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn wrap_source(script: &str) -> String {
    format!("fn {ENTRY_POINT}(record) {{\n{script}\n}}")
}

/// Creates a Rhai engine with the given sandbox limits.
fn create_engine(limits: &EngineLimits) -> Engine {
    let mut engine = Engine::new();

    engine.set_max_expr_depths(limits.max_expr_depth, limits.max_function_expr_depth);
    engine.set_max_call_levels(limits.max_call_levels);
    engine.set_max_string_size(limits.max_string_size);
    engine.set_max_array_size(limits.max_array_size);
    engine.set_max_map_size(limits.max_map_size);

    // 0 is unlimited
    engine.set_max_operations(limits.max_operations.unwrap_or(0));

    // Full would fold now_ms() into a compile-time constant
    engine.set_optimization_level(OptimizationLevel::Simple);

    // stdout carries the page output
    engine.on_print(|text| info!(target: "script", "{text}"));
    engine.on_debug(|text, source, pos| {
        debug!(target: "script", source = source.unwrap_or_default(), %pos, "{text}")
    });

    register_builtin_functions(&mut engine);

    engine
}
