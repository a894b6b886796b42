//! Error types for gravmap core operations.

/// Result type for gravmap core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in the gravity pipeline, geodesy functions and
/// model adapters.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed or incomplete input (missing CSV columns, bad values).
    #[error("validation error: {0}")]
    Validation(String),

    /// No gravity data is loaded; the operation needs a dataset.
    #[error("no gravity data loaded; upload data first")]
    EmptyDataset,

    /// A model parameter is outside its documented range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The operation requires derived state that has not been computed yet.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// A numeric subroutine failed.
    #[error("model execution failed: {model} - {message}")]
    ModelExecution {
        /// The model that failed.
        model: &'static str,
        /// Underlying cause.
        message: String,
    },
}
