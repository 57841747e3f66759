//! Index and query error types.

use thiserror::Error;

/// Errors raised while building or opening the search index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Underlying index library failure.
    #[error("index error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// Index directory could not be opened.
    #[error("index directory error: {0}")]
    Directory(#[from] tantivy::directory::error::OpenDirectoryError),

    /// Filesystem failure managing the index directory.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Store failure while assembling documents.
    #[error("store error: {0}")]
    Store(#[from] snomed_store::StoreError),

    /// An index-build worker panicked.
    #[error("index build worker panicked")]
    WorkerPanicked,
}

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors returned to callers of the query layer.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Index failure during evaluation.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Underlying index library failure.
    #[error("index error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// Store failure during evaluation.
    #[error("store error: {0}")]
    Store(#[from] snomed_store::StoreError),

    /// Cardinality range with `max < min`.
    #[error("invalid cardinality [{min}..{max}]")]
    InvalidCardinality {
        /// Lower bound.
        min: u32,
        /// Upper bound.
        max: u32,
    },

    /// ECL feature the evaluator does not implement.
    #[error("unsupported ECL construct: {0}")]
    Unsupported(String),

    /// An operation that requires at least one refset received none.
    #[error("empty refset set")]
    EmptyRefsets,
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;
