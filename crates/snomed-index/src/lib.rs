//! # snomed-index
//!
//! Full-text and expression-constraint search over a SNOMED CT store.
//!
//! The index holds one document per description, carrying the raw and
//! analyzed term, activity flags, the concept's transitive and direct
//! parents per relationship type, concrete values, refset memberships
//! and per-language preferred synonyms. On top of it sit the query
//! algebra ([`Queries`]), the ECL evaluator ([`ecl::EclEvaluator`]) and
//! the autocomplete/ranked search entry point
//! ([`SearchIndex::search`]).

#![warn(missing_docs)]

use std::path::Path;

use tantivy::{Index, IndexReader};

mod build;
mod collector;
mod document;
pub mod ecl;
mod error;
mod query;
mod schema;
mod search;

pub use build::build_index;
pub use collector::ConceptSetCollector;
pub use error::{IndexError, IndexResult, QueryError, QueryResult};
pub use query::{NumericComparison, Queries};
pub use schema::{register_tokenizers, IndexSpec, SearchSchema};
pub use search::{SearchHit, SearchMode, SearchRequest};

// Re-export snomed-types for convenience
pub use snomed_types;

/// An opened search index: the directory-backed index, a reader and
/// the schema handles.
pub struct SearchIndex {
    /// The underlying index.
    pub index: Index,
    /// Reader for query execution; reload after rebuilds.
    pub reader: IndexReader,
    /// Schema handles.
    pub schema: SearchSchema,
}

impl SearchIndex {
    /// Opens an existing index directory, re-registering the folding
    /// analyzer.
    pub fn open<P: AsRef<Path>>(path: P) -> IndexResult<Self> {
        let index = Index::open_in_dir(path)?;
        register_tokenizers(&index);
        let schema = SearchSchema::from_index(&index)?;
        let reader = index.reader()?;
        Ok(Self { index, reader, schema })
    }
}
