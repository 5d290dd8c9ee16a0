// error.rs - Error taxonomy for matrix, distance and clustering operations

use thiserror::Error;

/// Main error type for aligntree operations
#[derive(Error, Debug)]
pub enum TreeError {
    /// Matrix width disagrees with the alignment row count or a supplied matrix
    #[error("Dimension mismatch ({context}): expected {expected}, found {found}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        found: usize,
    },

    /// Diagonal access, out-of-range row/column, or access into an empty matrix
    #[error("Invalid matrix index: {0}")]
    InvalidIndex(String),

    /// Unknown linkage method, clustering method or distance model
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// Packed storage for the requested width cannot be represented or allocated
    #[error("Cannot allocate distance matrix of width {width}")]
    Allocation { width: usize },

    #[error("Invalid alignment: {0}")]
    InvalidAlignment(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for aligntree operations
pub type Result<T> = std::result::Result<T, TreeError>;

impl TreeError {
    pub fn dimension_mismatch(context: impl Into<String>, expected: usize, found: usize) -> Self {
        TreeError::DimensionMismatch {
            context: context.into(),
            expected,
            found,
        }
    }
}

impl From<csv::Error> for TreeError {
    fn from(err: csv::Error) -> Self {
        TreeError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for TreeError {
    fn from(err: serde_json::Error) -> Self {
        TreeError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for TreeError {
    fn from(err: toml::de::Error) -> Self {
        TreeError::Configuration(err.to_string())
    }
}

impl From<regex::Error> for TreeError {
    fn from(err: regex::Error) -> Self {
        TreeError::Configuration(format!("invalid regex: {}", err))
    }
}
