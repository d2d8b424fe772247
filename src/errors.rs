use thiserror::Error;

/// Errors that can occur during statistical analysis
#[derive(Error, Debug)]
pub enum StatsError {
    // Decision-tree configuration errors
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    #[error("Prerequisite not met: {missing} test must be performed before running {requested}")]
    PrerequisiteNotMet {
        missing: &'static str,
        requested: &'static str,
    },

    #[error("Reference column '{column}' not found; valid choices: {valid:?}")]
    InvalidReference { column: String, valid: Vec<String> },

    // Input validation errors
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Column '{column}' has {len} rows, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        len: usize,
        expected: usize,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Numeric errors from the distribution library propagate unmodified
    #[error(transparent)]
    Distribution(#[from] statrs::StatsError),
}

/// Result type for statistical operations
pub type StatsResult<T> = Result<T, StatsError>;
