//! Error types and classification for the script filter stage.
//!
//! This crate provides:
//! - [`SfError`] - Top-level error enum for everything the stage can fail with
//! - Domain-specific errors ([`SchemaError`], [`TransformError`], [`PageError`])
//! - [`ErrorScope`] telling the host pipeline whether a failure aborts the
//!   current batch or the whole run
//! - [`ProcessingStage`] for tagging where inside a record a failure happened

use thiserror::Error;

/// Top-level error type for the script filter stage.
#[derive(Error, Debug)]
pub enum SfError {
    /// Schema construction or lookup errors
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Record transformation errors (codec, user script)
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Page read/build errors
    #[error("Page error: {0}")]
    Page(#[from] PageError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Schema-related errors.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Two columns share a name
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// A referenced column does not exist
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// A column specification could not be parsed
    #[error("Invalid column spec: {0}")]
    InvalidSpec(String),
}

/// Errors raised while moving a record across the scripting boundary.
#[derive(Error, Debug)]
pub enum TransformError {
    /// Column type outside {string, int64, float64, boolean, timestamp}
    #[error("Unsupported type for column '{column}': {data_type}")]
    UnsupportedType { column: String, data_type: String },

    /// Script value kind incompatible with the target column
    #[error("Type mismatch for column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    /// User script raised, returned nothing, or returned a non-map
    #[error("User code error: {0}")]
    UserCode(String),

    /// Script compilation failed
    #[error("Script compilation failed: {0}")]
    Compilation(String),

    /// The evaluator was already released by finish/close
    #[error("Evaluator already released")]
    Released,
}

/// Page-related errors.
#[derive(Error, Debug)]
pub enum PageError {
    /// Page layout does not match the declared schema
    #[error("Page does not match schema: {0}")]
    SchemaMismatch(String),

    /// A cell holds a value the target representation cannot carry
    #[error("Invalid value in column '{column}': {reason}")]
    InvalidValue { column: String, reason: String },

    /// Sealing the output page failed
    #[error("Failed to build page: {0}")]
    Build(String),

    /// Downstream consumer rejected a page
    #[error("Output failed: {0}")]
    Output(String),
}

/// How far a failure reaches.
///
/// The stage never skips records on its own; it only reports which unit of
/// work is poisoned and leaves retry/abort policy to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// The current batch is aborted; later batches may still succeed.
    ///
    /// Examples: type mismatch in a script result, script raised an error
    Batch,

    /// Nothing can succeed with this configuration and schema.
    ///
    /// Examples: unsupported column type, script does not compile
    Run,
}

/// Where inside one record's processing an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Reading typed cells into a generic record
    Marshal,

    /// Running the user script
    Invoke,

    /// Encoding the script result into typed cells
    Unmarshal,

    /// Sealing and handing the page downstream
    Emit,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Marshal => write!(f, "Marshal"),
            Self::Invoke => write!(f, "Invoke"),
            Self::Unmarshal => write!(f, "Unmarshal"),
            Self::Emit => write!(f, "Emit"),
        }
    }
}

/// Classifies an error to tell the host whether to abort the batch or the run.
pub fn classify_error(error: &SfError) -> ErrorScope {
    match error {
        SfError::Schema(_) => ErrorScope::Run,
        SfError::Transform(e) => classify_transform_error(e),
        SfError::Page(e) => classify_page_error(e),
        SfError::Config(_) => ErrorScope::Run,
    }
}

fn classify_transform_error(error: &TransformError) -> ErrorScope {
    match error {
        TransformError::UnsupportedType { .. } => ErrorScope::Run,
        TransformError::TypeMismatch { .. } => ErrorScope::Batch,
        TransformError::UserCode(_) => ErrorScope::Batch,
        TransformError::Compilation(_) => ErrorScope::Run,
        TransformError::Released => ErrorScope::Run,
    }
}

fn classify_page_error(error: &PageError) -> ErrorScope {
    match error {
        PageError::SchemaMismatch(_) => ErrorScope::Batch,
        PageError::InvalidValue { .. } => ErrorScope::Batch,
        PageError::Build(_) => ErrorScope::Batch,
        PageError::Output(_) => ErrorScope::Batch,
    }
}

/// Result type alias using SfError.
pub type Result<T> = std::result::Result<T, SfError>;
