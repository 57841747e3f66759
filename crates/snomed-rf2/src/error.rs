//! Error and result types for RF2 file processing.

use thiserror::Error;

/// Errors that can occur while decoding and parsing RF2 files.
#[derive(Error, Debug)]
pub enum Rf2Error {
    /// I/O error reading an RF2 file.
    #[error("IO error reading RF2 file: {0}")]
    Io(#[from] std::io::Error),

    /// CSV-level parsing error.
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// File name does not follow the RF2 naming convention.
    #[error("unrecognized RF2 file name: {name}")]
    UnrecognizedFilename {
        /// The offending file name.
        name: String,
    },

    /// Invalid SCTID field.
    #[error("invalid SCTID: {value}")]
    InvalidSctId {
        /// The invalid value.
        value: String,
    },

    /// Invalid UUID field.
    #[error("invalid UUID: {value}")]
    InvalidUuid {
        /// The invalid value.
        value: String,
    },

    /// Invalid YYYYMMDD date field.
    #[error("invalid date: {value}")]
    InvalidDate {
        /// The invalid value.
        value: String,
    },

    /// Invalid boolean field.
    #[error("invalid boolean: {value} (expected 0 or 1)")]
    InvalidBoolean {
        /// The invalid value.
        value: String,
    },

    /// Invalid integer field.
    #[error("invalid integer: {value}")]
    InvalidInteger {
        /// The invalid value.
        value: String,
    },

    /// Row has fewer columns than its file's pattern requires.
    #[error("row has {found} columns, expected {expected}")]
    ShortRow {
        /// Expected column count.
        expected: usize,
        /// Found column count.
        found: usize,
    },

    /// A pattern character other than `c`, `i` or `s`.
    #[error("invalid refset field pattern: {pattern}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
    },

    /// Unexpected header column.
    #[error("unexpected column '{found}' at position {position}, expected '{expected}'")]
    UnexpectedColumn {
        /// The column position.
        position: usize,
        /// Expected column name.
        expected: String,
        /// Found column name.
        found: String,
    },

    /// Directory not found.
    #[error("directory not found: {path}")]
    DirectoryNotFound {
        /// The path that was not found.
        path: String,
    },
}

/// Result type for RF2 operations.
pub type Rf2Result<T> = Result<T, Rf2Error>;
