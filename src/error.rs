//! Error types for graph construction and analysis

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised by graph construction, analysis and persistence.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The graph-construction method string is not one of the supported methods.
    #[error("unsupported graph construction method: {0}")]
    InvalidMethod(String),

    /// Raw and preprocessed inputs cannot be reconciled row by row.
    #[error("input shape mismatch: {0}")]
    InputShapeMismatch(String),

    /// A partition does not cover the graph's node set exactly.
    #[error(
        "partition does not match graph nodes: missing from partition {missing:?}, \
         not in graph {extraneous:?}, assigned more than once {duplicated:?}"
    )]
    PartitionMismatch {
        /// Graph nodes absent from every community.
        missing: Vec<usize>,
        /// Partition members that are not graph nodes.
        extraneous: Vec<usize>,
        /// Nodes listed in more than one community.
        duplicated: Vec<usize>,
    },

    /// The input carries nothing to work with.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// No node carries the requested attribute.
    #[error("no node carries attribute '{0}'")]
    UnknownAttribute(String),

    /// A parameter is outside its valid range.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    /// A configured column does not exist in the input table.
    #[error("column not found: {0}")]
    MissingColumn(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}
