//! # snomed-store
//!
//! Persistent store and hierarchy traversal for SNOMED CT snapshots.
//!
//! Components are kept in an embedded ordered key-value database whose
//! composite-key tables double as reverse indices: descriptions by
//! concept, active relationships by source and by destination, refset
//! items by component and by refset, map items by target, and the
//! materialized IS_A ancestor closure. Writes apply a
//! max-effective-time merge per component id, so ingestion is
//! idempotent and batch order does not matter.
//!
//! The crate also resolves BCP-47 language priority lists to language
//! refsets ([`LanguageMap`]) and assembles the denormalized
//! [`snomed_types::ExtendedConcept`] view the search indexer consumes.
//!
//! ## Usage
//!
//! ```no_run
//! use snomed_store::SnomedStore;
//!
//! # fn main() -> Result<(), snomed_store::StoreError> {
//! let store = SnomedStore::open("/var/lib/snomed/store.db")?;
//! if let Some(concept) = store.get_concept(73211009)? {
//!     println!("{} active={}", concept.id, concept.active);
//! }
//! for parent in store.get_parents(73211009)? {
//!     println!("parent {parent}");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod extended;
mod locale;
mod store;
mod tables;

pub use error::{StoreError, StoreResult};
pub use locale::LanguageMap;
pub use store::SnomedStore;

// Re-export snomed-types for convenience
pub use snomed_types;
