//! Store error types.
//!
//! Any error surfacing from this module is fatal to the operation in
//! progress: the key-value layer does not produce recoverable row-level
//! failures the way RF2 parsing does.

use thiserror::Error;

/// Errors raised by the persistent store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failure opening or creating the database file.
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    /// Failure beginning a transaction.
    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    /// Failure opening a table.
    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    /// Failure reading or writing storage.
    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    /// Failure committing a transaction.
    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    /// Record serialization failure.
    #[error("record codec error: {0}")]
    Codec(#[from] bincode::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
