//! # snomed-rf2
//!
//! Parser for SNOMED CT Release Format 2 (RF2) distribution files.
//!
//! The crate decodes RF2 file names into component kinds and field
//! patterns, parses tab-delimited rows into the typed records of
//! [`snomed_types`], reifies reference-set rows into concrete shapes,
//! and streams whole releases as bounded batches for the ingestion
//! pipeline.
//!
//! ## Usage
//!
//! ```no_run
//! use snomed_rf2::{discover_release_files, stream_release, ComponentBatch, DEFAULT_BATCH_SIZE};
//!
//! # fn main() -> Result<(), snomed_rf2::Rf2Error> {
//! let release = discover_release_files("/data/SnomedCT_InternationalRF2")?;
//! let stats = stream_release(&release.files, DEFAULT_BATCH_SIZE, |batch| {
//!     match &batch {
//!         ComponentBatch::Concepts(rows) => println!("{} concepts", rows.len()),
//!         _ => {}
//!     }
//!     true
//! })?;
//! println!("{} rows, {} parse errors", stats.rows, stats.parse_errors);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod batch;
mod discover;
mod error;
pub mod filename;
mod parse;
pub mod reify;

pub use batch::{stream_file, stream_release, ComponentBatch, FileStats, DEFAULT_BATCH_SIZE};
pub use discover::{discover_release_files, ReleaseFiles};
pub use error::{Rf2Error, Rf2Result};
pub use filename::{Entity, ReleaseType, Rf2Filename};
pub use parse::{Rf2FileReader, Rf2Record, ToRf2Row};
pub use reify::{
    attribute_description_for_column, descriptor_sequence, kind_for_descriptor, RefsetFileReader,
};

// Re-export snomed-types for convenience
pub use snomed_types;
