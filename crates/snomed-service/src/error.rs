//! Service error type.

use thiserror::Error;

/// Errors surfaced by the service facade.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Release file decoding or parsing failure.
    #[error(transparent)]
    Rf2(#[from] snomed_rf2::Rf2Error),

    /// Store failure; fatal to the operation in progress.
    #[error(transparent)]
    Store(#[from] snomed_store::StoreError),

    /// Index build or open failure.
    #[error(transparent)]
    Index(#[from] snomed_index::IndexError),

    /// Query failure, returned to the caller verbatim.
    #[error(transparent)]
    Query(#[from] snomed_index::QueryError),

    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A search or ECL call before any release was imported.
    #[error("no search index: import a release first")]
    IndexNotBuilt,

    /// An ingestion worker panicked.
    #[error("ingestion worker panicked")]
    WorkerPanicked,
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
