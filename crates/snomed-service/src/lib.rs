//! # snomed-service
//!
//! The terminology-service facade: a [`Service`] owns the persistent
//! store, the search index and the cached locale map, exposes the
//! lookup/traversal/search API, and rebuilds everything from an RF2
//! release directory via [`Service::import_release`].
//!
//! ## Usage
//!
//! ```no_run
//! use snomed_service::Service;
//!
//! # fn main() -> Result<(), snomed_service::ServiceError> {
//! let mut service = Service::open("/var/lib/snomed")?;
//! service.import_release("/data/SnomedCT_InternationalRF2")?;
//!
//! let ms = service.get_concept(24700007)?;
//! let preferred = service.get_preferred_synonym(80146002, "en-GB")?;
//! println!("{:?} {:?}", ms, preferred.map(|d| d.term));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use snomed_index::ecl::EclExpression;
use snomed_index::{build_index, SearchHit, SearchIndex, SearchRequest};
use snomed_store::{LanguageMap, SnomedStore};
use snomed_types::{Concept, Description, RefsetItem, SctId};
use tracing::info;

mod error;
mod import;

pub use error::{ServiceError, ServiceResult};
pub use import::ImportSummary;

// Re-export the crates a caller needs to drive the service.
pub use snomed_index;
pub use snomed_store;
pub use snomed_types;

/// Name of the key-value store file inside the service directory.
const STORE_FILE: &str = "store.db";
/// Name of the search-index directory inside the service directory.
const INDEX_DIR: &str = "index";

/// An opened terminology service rooted at a directory.
///
/// The store and index reader are read-mostly shared state; the service
/// releases file handles when dropped. Lookups on an id that is not
/// present return `Ok(None)`, never an error.
pub struct Service {
    store: Arc<SnomedStore>,
    index: Option<SearchIndex>,
    language_map: LanguageMap,
    root: PathBuf,
}

impl Service {
    /// Opens (or initializes) a service directory.
    pub fn open<P: AsRef<Path>>(path: P) -> ServiceResult<Self> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        let store = Arc::new(SnomedStore::open(root.join(STORE_FILE))?);

        let index_dir = root.join(INDEX_DIR);
        let index =
            if index_dir.is_dir() { Some(SearchIndex::open(&index_dir)?) } else { None };

        let language_map = LanguageMap::new(store.installed_language_refsets()?);
        info!(root = %root.display(), indexed = index.is_some(), "service opened");
        Ok(Self { store, index, language_map, root })
    }

    /// Flushes and releases the service. Dropping has the same effect;
    /// this form makes the lifecycle explicit at call sites.
    pub fn close(self) {}

    /// The underlying store, for callers composing their own queries.
    pub fn store(&self) -> &SnomedStore {
        &self.store
    }

    /// Ingests an RF2 release directory, then rebuilds the transitive
    /// closure, the search index and the locale map.
    pub fn import_release<P: AsRef<Path>>(&mut self, dir: P) -> ServiceResult<ImportSummary> {
        let summary = import::ingest_release(&self.store, dir.as_ref())?;
        let index = build_index(&self.store, &self.root.join(INDEX_DIR))?;
        self.index = Some(index);
        self.language_map = LanguageMap::new(self.store.installed_language_refsets()?);
        Ok(summary)
    }

    fn index(&self) -> ServiceResult<&SearchIndex> {
        self.index.as_ref().ok_or(ServiceError::IndexNotBuilt)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Component lookup and traversal
    // ═══════════════════════════════════════════════════════════════════

    /// Fetches a concept.
    pub fn get_concept(&self, id: SctId) -> ServiceResult<Option<Concept>> {
        Ok(self.store.get_concept(id)?)
    }

    /// Fetches a description.
    pub fn get_description(&self, id: SctId) -> ServiceResult<Option<Description>> {
        Ok(self.store.get_description(id)?)
    }

    /// All descriptions of a concept.
    pub fn get_concept_descriptions(&self, id: SctId) -> ServiceResult<Vec<Description>> {
        Ok(self.store.get_concept_descriptions(id)?)
    }

    /// Active `(type, destination)` pairs of a concept.
    pub fn get_parent_relationships(&self, id: SctId) -> ServiceResult<Vec<(SctId, SctId)>> {
        Ok(self.store.get_parent_relationships(id)?)
    }

    /// Active destinations for one relationship type.
    pub fn get_parent_relationships_of_type(
        &self,
        id: SctId,
        type_id: SctId,
    ) -> ServiceResult<Vec<SctId>> {
        Ok(self.store.get_parent_relationships_of_type(id, type_id)?)
    }

    /// Destinations for the given types and their subtypes.
    pub fn get_parent_relationships_expanded(
        &self,
        id: SctId,
        type_ids: &[SctId],
    ) -> ServiceResult<HashSet<SctId>> {
        Ok(self.store.get_parent_relationships_expanded(id, type_ids)?)
    }

    /// Direct IS_A parents.
    pub fn get_parents(&self, id: SctId) -> ServiceResult<Vec<SctId>> {
        Ok(self.store.get_parents(id)?)
    }

    /// Direct IS_A children.
    pub fn get_children(&self, id: SctId) -> ServiceResult<Vec<SctId>> {
        Ok(self.store.get_children(id)?)
    }

    /// Transitive IS_A ancestors, self excluded.
    pub fn get_all_parents(&self, id: SctId) -> ServiceResult<HashSet<SctId>> {
        Ok(self.store.all_ancestors(id)?)
    }

    /// Transitive IS_A descendants, self excluded.
    pub fn get_all_children(&self, id: SctId) -> ServiceResult<HashSet<SctId>> {
        Ok(self.store.all_descendants(id)?)
    }

    /// Refset items referencing a component; `refset_id` 0 means any.
    pub fn get_component_refset_items(
        &self,
        component_id: SctId,
        refset_id: SctId,
    ) -> ServiceResult<Vec<RefsetItem>> {
        Ok(self.store.get_component_refset_items(component_id, refset_id)?)
    }

    /// Refsets a component is an active member of.
    pub fn get_component_refset_ids(&self, component_id: SctId) -> ServiceResult<HashSet<SctId>> {
        Ok(self.store.get_component_refset_ids(component_id)?)
    }

    /// Refsets with at least one ingested item.
    pub fn installed_refsets(&self) -> ServiceResult<HashSet<SctId>> {
        Ok(self.store.installed_refsets()?)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Locale-aware lookups
    // ═══════════════════════════════════════════════════════════════════

    /// Resolves a BCP-47 priority list to an ordered language-refset
    /// list against the currently installed refsets.
    pub fn resolve_locale(&self, priority_list: &str) -> Vec<SctId> {
        self.language_map.resolve(priority_list)
    }

    /// The preferred synonym of a concept under a locale priority list.
    pub fn get_preferred_synonym(
        &self,
        id: SctId,
        locale: &str,
    ) -> ServiceResult<Option<Description>> {
        let refsets = self.resolve_locale(locale);
        Ok(self.store.preferred_synonym(id, &refsets)?)
    }

    /// The first active fully specified name of a concept.
    pub fn get_fully_specified_name(&self, id: SctId) -> ServiceResult<Option<Description>> {
        Ok(self.store.fully_specified_name(id)?)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Search and ECL
    // ═══════════════════════════════════════════════════════════════════

    /// Runs a free-text search.
    pub fn search(&self, request: &SearchRequest) -> ServiceResult<Vec<SearchHit>> {
        Ok(self.index()?.search(&self.store, request)?)
    }

    /// Evaluates an ECL expression and materializes its concept set.
    pub fn realize_ecl(&self, expression: &EclExpression) -> ServiceResult<HashSet<SctId>> {
        let index = self.index()?;
        let evaluator = snomed_index::ecl::EclEvaluator::new(index, &self.store);
        Ok(evaluator.realize(expression)?)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Maps and historical associations
    // ═══════════════════════════════════════════════════════════════════

    /// Active historical associations of a component, grouped by refset.
    pub fn historical_associations(
        &self,
        id: SctId,
    ) -> ServiceResult<HashMap<SctId, Vec<RefsetItem>>> {
        Ok(self.store.historical_associations(id)?)
    }

    /// Active map items of a refset with the given target code.
    pub fn reverse_map(&self, refset_id: SctId, target: &str) -> ServiceResult<Vec<RefsetItem>> {
        Ok(self.store.reverse_map(refset_id, target)?)
    }
}
