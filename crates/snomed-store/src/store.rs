//! The persistent SNOMED CT component store.
//!
//! Components are written through a max-effective-time merge: for each
//! identifier the store retains the record with the greatest
//! `effective_time`, and on equal dates the later write wins, so
//! replaying a snapshot is idempotent. Relationship and refset writes
//! maintain the composite-key indices that serve hierarchy traversal
//! and membership lookups.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use rayon::prelude::*;
use redb::{Database, ReadableTable, ReadableTableMetadata};
use snomed_types::{
    well_known, Concept, ConcreteRelationship, Description, RefsetItem, Relationship, SctId,
};
use tracing::info;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::tables::*;

/// Number of concepts whose ancestor sets are computed per closure
/// write transaction.
const CLOSURE_CHUNK: usize = 10_000;

/// Persistent store over an embedded key-value database.
///
/// The store is read-mostly: ingestion writes batches, everything else
/// is concurrent reads. A `SnomedStore` is `Sync` and can be shared
/// behind an `Arc`.
pub struct SnomedStore {
    db: Database,
}

impl SnomedStore {
    /// Opens (or creates) a store at the given file path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = Database::create(path)?;
        let txn = db.begin_write()?;
        create_all(&txn)?;
        txn.commit()?;
        Ok(Self { db })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Batch writes
    // ═══════════════════════════════════════════════════════════════════

    /// Inserts concepts, applying the max-effective-time merge.
    pub fn insert_concepts(
        &self,
        concepts: impl IntoIterator<Item = Concept>,
    ) -> StoreResult<usize> {
        let txn = self.db.begin_write()?;
        let mut written = 0;
        {
            let mut table = txn.open_table(CONCEPTS)?;
            for concept in concepts {
                let existing: Option<Concept> = match table.get(concept.id)? {
                    Some(guard) => Some(bincode::deserialize(guard.value())?),
                    None => None,
                };
                if keeps(existing.as_ref().map(|c| c.effective_time), concept.effective_time) {
                    table.insert(concept.id, bincode::serialize(&concept)?.as_slice())?;
                    written += 1;
                }
            }
        }
        txn.commit()?;
        Ok(written)
    }

    /// Inserts descriptions, maintaining the concept→description index.
    pub fn insert_descriptions(
        &self,
        descriptions: impl IntoIterator<Item = Description>,
    ) -> StoreResult<usize> {
        let txn = self.db.begin_write()?;
        let mut written = 0;
        {
            let mut table = txn.open_table(DESCRIPTIONS)?;
            let mut by_concept = txn.open_table(CONCEPT_DESCRIPTIONS)?;
            for description in descriptions {
                let existing: Option<Description> = match table.get(description.id)? {
                    Some(guard) => Some(bincode::deserialize(guard.value())?),
                    None => None,
                };
                if !keeps(existing.as_ref().map(|d| d.effective_time), description.effective_time)
                {
                    continue;
                }
                if let Some(old) = existing {
                    if old.concept_id != description.concept_id {
                        by_concept.remove((old.concept_id, old.id))?;
                    }
                }
                by_concept.insert((description.concept_id, description.id), ())?;
                table.insert(description.id, bincode::serialize(&description)?.as_slice())?;
                written += 1;
            }
        }
        txn.commit()?;
        Ok(written)
    }

    /// Inserts relationships, maintaining the parent/child indices.
    ///
    /// Index entries exist only for the active latest version of each
    /// relationship: replacing an active record with an inactive one
    /// removes its edges.
    pub fn insert_relationships(
        &self,
        relationships: impl IntoIterator<Item = Relationship>,
    ) -> StoreResult<usize> {
        let txn = self.db.begin_write()?;
        let mut written = 0;
        {
            let mut table = txn.open_table(RELATIONSHIPS)?;
            let mut parents = txn.open_table(PARENTS)?;
            let mut children = txn.open_table(CHILDREN)?;
            let mut types = txn.open_table(RELATIONSHIP_TYPES)?;
            for relationship in relationships {
                let existing: Option<Relationship> = match table.get(relationship.id)? {
                    Some(guard) => Some(bincode::deserialize(guard.value())?),
                    None => None,
                };
                if !keeps(
                    existing.as_ref().map(|r| r.effective_time),
                    relationship.effective_time,
                ) {
                    continue;
                }
                if let Some(old) = existing {
                    if old.active {
                        parents.remove((old.source_id, old.type_id, old.destination_id))?;
                        children.remove((old.destination_id, old.type_id, old.source_id))?;
                    }
                }
                if relationship.active {
                    parents.insert(
                        (relationship.source_id, relationship.type_id, relationship.destination_id),
                        (),
                    )?;
                    children.insert(
                        (relationship.destination_id, relationship.type_id, relationship.source_id),
                        (),
                    )?;
                    types.insert(relationship.type_id, ())?;
                }
                table.insert(relationship.id, bincode::serialize(&relationship)?.as_slice())?;
                written += 1;
            }
        }
        txn.commit()?;
        Ok(written)
    }

    /// Inserts concrete-value relationships, maintaining the per-concept
    /// index and the per-type numeric/string classification.
    pub fn insert_concrete_relationships(
        &self,
        relationships: impl IntoIterator<Item = ConcreteRelationship>,
    ) -> StoreResult<usize> {
        let txn = self.db.begin_write()?;
        let mut written = 0;
        {
            let mut table = txn.open_table(CONCRETE_RELATIONSHIPS)?;
            let mut by_concept = txn.open_table(CONCEPT_CONCRETE)?;
            let mut types = txn.open_table(CONCRETE_TYPES)?;
            for relationship in relationships {
                let existing: Option<ConcreteRelationship> = match table.get(relationship.id)? {
                    Some(guard) => Some(bincode::deserialize(guard.value())?),
                    None => None,
                };
                if !keeps(
                    existing.as_ref().map(|r| r.effective_time),
                    relationship.effective_time,
                ) {
                    continue;
                }
                if let Some(old) = existing {
                    if old.source_id != relationship.source_id {
                        by_concept.remove((old.source_id, old.id))?;
                    }
                }
                by_concept.insert((relationship.source_id, relationship.id), ())?;

                let numeric = relationship.value.starts_with('#')
                    && relationship.value[1..].parse::<f64>().is_ok();
                let flag = match types.get(relationship.type_id)? {
                    Some(existing_flag) => existing_flag.value() & u8::from(numeric),
                    None => u8::from(numeric),
                };
                types.insert(relationship.type_id, flag)?;

                table.insert(relationship.id, bincode::serialize(&relationship)?.as_slice())?;
                written += 1;
            }
        }
        txn.commit()?;
        Ok(written)
    }

    /// Inserts refset items, maintaining membership indices, the
    /// installed-refset list and the map-target reverse index.
    pub fn insert_refset_items(
        &self,
        items: impl IntoIterator<Item = RefsetItem>,
    ) -> StoreResult<usize> {
        let txn = self.db.begin_write()?;
        let mut written = 0;
        {
            let mut table = txn.open_table(REFSET_ITEMS)?;
            let mut by_component = txn.open_table(COMPONENT_REFSETS)?;
            let mut by_refset = txn.open_table(REFSET_MEMBERS)?;
            let mut installed = txn.open_table(INSTALLED_REFSETS)?;
            let mut map_targets = txn.open_table(MAP_TARGETS)?;
            for item in items {
                let key = item.header().id.as_u128();
                let existing: Option<RefsetItem> = match table.get(key)? {
                    Some(guard) => Some(bincode::deserialize(guard.value())?),
                    None => None,
                };
                if !keeps(
                    existing.as_ref().map(|i| i.header().effective_time),
                    item.header().effective_time,
                ) {
                    continue;
                }
                if let Some(old) = existing {
                    let old_header = old.header();
                    by_component.remove((
                        old_header.referenced_component_id,
                        old_header.refset_id,
                        key,
                    ))?;
                    by_refset.remove((
                        old_header.refset_id,
                        old_header.referenced_component_id,
                        key,
                    ))?;
                    if let Some(target) = old.map_target() {
                        map_targets.remove((old_header.refset_id, target, key))?;
                    }
                }

                let header = item.header();
                by_component.insert((header.referenced_component_id, header.refset_id, key), ())?;
                by_refset.insert((header.refset_id, header.referenced_component_id, key), ())?;
                installed.insert(header.refset_id, ())?;
                if let Some(target) = item.map_target() {
                    map_targets.insert((header.refset_id, target, key), ())?;
                }
                table.insert(key, bincode::serialize(&item)?.as_slice())?;
                written += 1;
            }
        }
        txn.commit()?;
        Ok(written)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Component lookups
    // ═══════════════════════════════════════════════════════════════════

    /// Fetches a concept by id.
    pub fn get_concept(&self, id: SctId) -> StoreResult<Option<Concept>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(CONCEPTS)?;
        match table.get(id)? {
            Some(guard) => Ok(Some(bincode::deserialize(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Fetches a description by id.
    pub fn get_description(&self, id: SctId) -> StoreResult<Option<Description>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(DESCRIPTIONS)?;
        match table.get(id)? {
            Some(guard) => Ok(Some(bincode::deserialize(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Fetches a relationship by id.
    pub fn get_relationship(&self, id: SctId) -> StoreResult<Option<Relationship>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(RELATIONSHIPS)?;
        match table.get(id)? {
            Some(guard) => Ok(Some(bincode::deserialize(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Fetches a refset item by member UUID.
    pub fn get_refset_item(&self, id: Uuid) -> StoreResult<Option<RefsetItem>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(REFSET_ITEMS)?;
        match table.get(id.as_u128())? {
            Some(guard) => Ok(Some(bincode::deserialize(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All descriptions of a concept, active and inactive.
    pub fn get_concept_descriptions(&self, concept_id: SctId) -> StoreResult<Vec<Description>> {
        let txn = self.db.begin_read()?;
        let index = txn.open_table(CONCEPT_DESCRIPTIONS)?;
        let table = txn.open_table(DESCRIPTIONS)?;
        let mut result = Vec::new();
        for entry in index.range((concept_id, 0u64)..=(concept_id, u64::MAX))? {
            let (key, _) = entry?;
            let (_, description_id) = key.value();
            if let Some(guard) = table.get(description_id)? {
                result.push(bincode::deserialize(guard.value())?);
            }
        }
        Ok(result)
    }

    /// All concrete-value relationships of a concept.
    pub fn get_concrete_relationships(
        &self,
        concept_id: SctId,
    ) -> StoreResult<Vec<ConcreteRelationship>> {
        let txn = self.db.begin_read()?;
        let index = txn.open_table(CONCEPT_CONCRETE)?;
        let table = txn.open_table(CONCRETE_RELATIONSHIPS)?;
        let mut result = Vec::new();
        for entry in index.range((concept_id, 0u64)..=(concept_id, u64::MAX))? {
            let (key, _) = entry?;
            let (_, relationship_id) = key.value();
            if let Some(guard) = table.get(relationship_id)? {
                result.push(bincode::deserialize(guard.value())?);
            }
        }
        Ok(result)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Hierarchy traversal
    // ═══════════════════════════════════════════════════════════════════

    /// Active outbound `(type, destination)` pairs of a concept.
    pub fn get_parent_relationships(&self, concept_id: SctId) -> StoreResult<Vec<(SctId, SctId)>> {
        let txn = self.db.begin_read()?;
        let parents = txn.open_table(PARENTS)?;
        let mut result = Vec::new();
        for entry in
            parents.range((concept_id, 0u64, 0u64)..=(concept_id, u64::MAX, u64::MAX))?
        {
            let (key, _) = entry?;
            let (_, type_id, destination_id) = key.value();
            result.push((type_id, destination_id));
        }
        Ok(result)
    }

    /// Active destinations of a concept for one relationship type.
    pub fn get_parent_relationships_of_type(
        &self,
        concept_id: SctId,
        type_id: SctId,
    ) -> StoreResult<Vec<SctId>> {
        let txn = self.db.begin_read()?;
        let parents = txn.open_table(PARENTS)?;
        let mut result = Vec::new();
        for entry in
            parents.range((concept_id, type_id, 0u64)..=(concept_id, type_id, u64::MAX))?
        {
            let (key, _) = entry?;
            result.push(key.value().2);
        }
        Ok(result)
    }

    /// Destinations of a concept for the given types and every subtype
    /// of those types (attribute subsumption over the type hierarchy).
    pub fn get_parent_relationships_expanded(
        &self,
        concept_id: SctId,
        type_ids: &[SctId],
    ) -> StoreResult<HashSet<SctId>> {
        let mut expanded_types = HashSet::new();
        for &type_id in type_ids {
            expanded_types.insert(type_id);
            expanded_types.extend(self.all_descendants(type_id)?);
        }
        let mut result = HashSet::new();
        for type_id in expanded_types {
            result.extend(self.get_parent_relationships_of_type(concept_id, type_id)?);
        }
        Ok(result)
    }

    /// Active sources pointing at a concept for one relationship type.
    pub fn get_child_relationships_of_type(
        &self,
        concept_id: SctId,
        type_id: SctId,
    ) -> StoreResult<Vec<SctId>> {
        let txn = self.db.begin_read()?;
        let children = txn.open_table(CHILDREN)?;
        let mut result = Vec::new();
        for entry in
            children.range((concept_id, type_id, 0u64)..=(concept_id, type_id, u64::MAX))?
        {
            let (key, _) = entry?;
            result.push(key.value().2);
        }
        Ok(result)
    }

    /// Direct IS_A parents.
    pub fn get_parents(&self, concept_id: SctId) -> StoreResult<Vec<SctId>> {
        self.get_parent_relationships_of_type(concept_id, well_known::IS_A)
    }

    /// Direct IS_A children.
    pub fn get_children(&self, concept_id: SctId) -> StoreResult<Vec<SctId>> {
        self.get_child_relationships_of_type(concept_id, well_known::IS_A)
    }

    /// Transitive IS_A ancestors from the materialized closure, self
    /// excluded.
    pub fn all_ancestors(&self, concept_id: SctId) -> StoreResult<HashSet<SctId>> {
        let txn = self.db.begin_read()?;
        let ancestors = txn.open_table(ANCESTORS)?;
        let mut result = HashSet::new();
        for entry in ancestors.range((concept_id, 0u64)..=(concept_id, u64::MAX))? {
            let (key, _) = entry?;
            result.insert(key.value().1);
        }
        Ok(result)
    }

    /// Transitive IS_A descendants, computed by breadth-first walk over
    /// the child index, self excluded.
    pub fn all_descendants(&self, concept_id: SctId) -> StoreResult<HashSet<SctId>> {
        let txn = self.db.begin_read()?;
        let children = txn.open_table(CHILDREN)?;
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([concept_id]);
        while let Some(current) = queue.pop_front() {
            for entry in children
                .range((current, well_known::IS_A, 0u64)..=(current, well_known::IS_A, u64::MAX))?
            {
                let (key, _) = entry?;
                let child = key.value().2;
                if seen.insert(child) {
                    queue.push_back(child);
                }
            }
        }
        seen.remove(&concept_id);
        Ok(seen)
    }

    /// The most general members of a set: those with no ancestor inside
    /// the set.
    pub fn top_of_set(&self, ids: &HashSet<SctId>) -> StoreResult<HashSet<SctId>> {
        let mut result = HashSet::new();
        for &id in ids {
            let ancestors = self.all_ancestors(id)?;
            if ancestors.intersection(ids).next().is_none() {
                result.insert(id);
            }
        }
        Ok(result)
    }

    /// The most specific members of a set: those that are not an
    /// ancestor of any other member.
    pub fn bottom_of_set(&self, ids: &HashSet<SctId>) -> StoreResult<HashSet<SctId>> {
        let mut not_bottom = HashSet::new();
        for &id in ids {
            for ancestor in self.all_ancestors(id)? {
                if ancestor != id && ids.contains(&ancestor) {
                    not_bottom.insert(ancestor);
                }
            }
        }
        Ok(ids.difference(&not_bottom).copied().collect())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Refset lookups
    // ═══════════════════════════════════════════════════════════════════

    /// Refset items referencing a component. A `refset_id` of 0 means
    /// "any refset".
    pub fn get_component_refset_items(
        &self,
        component_id: SctId,
        refset_id: SctId,
    ) -> StoreResult<Vec<RefsetItem>> {
        let txn = self.db.begin_read()?;
        let index = txn.open_table(COMPONENT_REFSETS)?;
        let table = txn.open_table(REFSET_ITEMS)?;
        let range = if refset_id == 0 {
            index.range((component_id, 0u64, 0u128)..=(component_id, u64::MAX, u128::MAX))?
        } else {
            index.range(
                (component_id, refset_id, 0u128)..=(component_id, refset_id, u128::MAX),
            )?
        };
        let mut result = Vec::new();
        for entry in range {
            let (key, _) = entry?;
            let (_, _, uuid) = key.value();
            if let Some(guard) = table.get(uuid)? {
                result.push(bincode::deserialize(guard.value())?);
            }
        }
        Ok(result)
    }

    /// Distinct refsets holding an active item for a component.
    pub fn get_component_refset_ids(&self, component_id: SctId) -> StoreResult<HashSet<SctId>> {
        let items = self.get_component_refset_items(component_id, 0)?;
        Ok(items
            .iter()
            .filter(|item| item.header().active)
            .map(|item| item.header().refset_id)
            .collect())
    }

    /// Refsets with at least one ingested item.
    pub fn installed_refsets(&self) -> StoreResult<HashSet<SctId>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(INSTALLED_REFSETS)?;
        let mut result = HashSet::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            result.insert(key.value());
        }
        Ok(result)
    }

    /// Distinct components with an active membership in a refset.
    pub fn refset_member_ids(&self, refset_id: SctId) -> StoreResult<HashSet<SctId>> {
        let txn = self.db.begin_read()?;
        let index = txn.open_table(REFSET_MEMBERS)?;
        let table = txn.open_table(REFSET_ITEMS)?;
        let mut result = HashSet::new();
        for entry in index.range((refset_id, 0u64, 0u128)..=(refset_id, u64::MAX, u128::MAX))? {
            let (key, _) = entry?;
            let (_, component_id, uuid) = key.value();
            if result.contains(&component_id) {
                continue;
            }
            if let Some(guard) = table.get(uuid)? {
                let item: RefsetItem = bincode::deserialize(guard.value())?;
                if item.header().active {
                    result.insert(component_id);
                }
            }
        }
        Ok(result)
    }

    /// Active historical-association items of a component, grouped by
    /// association refset.
    pub fn historical_associations(
        &self,
        component_id: SctId,
    ) -> StoreResult<HashMap<SctId, Vec<RefsetItem>>> {
        let items = self.get_component_refset_items(component_id, 0)?;
        let mut result: HashMap<SctId, Vec<RefsetItem>> = HashMap::new();
        for item in items {
            let header = item.header();
            if header.active && well_known::is_historical_association(header.refset_id) {
                result.entry(header.refset_id).or_default().push(item);
            }
        }
        Ok(result)
    }

    /// Active map items of a refset whose `mapTarget` equals `target`.
    pub fn reverse_map(&self, refset_id: SctId, target: &str) -> StoreResult<Vec<RefsetItem>> {
        let txn = self.db.begin_read()?;
        let index = txn.open_table(MAP_TARGETS)?;
        let table = txn.open_table(REFSET_ITEMS)?;
        let mut result = Vec::new();
        for entry in index.range((refset_id, target, 0u128)..=(refset_id, target, u128::MAX))? {
            let (key, _) = entry?;
            let (_, _, uuid) = key.value();
            if let Some(guard) = table.get(uuid)? {
                let item: RefsetItem = bincode::deserialize(guard.value())?;
                if item.header().active {
                    result.push(item);
                }
            }
        }
        Ok(result)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Enumeration (index build support)
    // ═══════════════════════════════════════════════════════════════════

    /// All stored concept ids.
    pub fn all_concept_ids(&self) -> StoreResult<Vec<SctId>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(CONCEPTS)?;
        let mut result = Vec::with_capacity(table.len()? as usize);
        for entry in table.iter()? {
            let (key, _) = entry?;
            result.push(key.value());
        }
        Ok(result)
    }

    /// Distinct relationship types seen in active relationships.
    pub fn relationship_type_ids(&self) -> StoreResult<Vec<SctId>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(RELATIONSHIP_TYPES)?;
        let mut result = Vec::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            result.push(key.value());
        }
        Ok(result)
    }

    /// Distinct concrete-value types, with `true` when every observed
    /// value of the type was numeric.
    pub fn concrete_type_ids(&self) -> StoreResult<Vec<(SctId, bool)>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(CONCRETE_TYPES)?;
        let mut result = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            result.push((key.value(), value.value() == 1));
        }
        Ok(result)
    }

    /// Number of stored concepts.
    pub fn concept_count(&self) -> StoreResult<u64> {
        let txn = self.db.begin_read()?;
        Ok(txn.open_table(CONCEPTS)?.len()?)
    }

    /// Number of stored descriptions.
    pub fn description_count(&self) -> StoreResult<u64> {
        let txn = self.db.begin_read()?;
        Ok(txn.open_table(DESCRIPTIONS)?.len()?)
    }

    /// Number of stored relationships.
    pub fn relationship_count(&self) -> StoreResult<u64> {
        let txn = self.db.begin_read()?;
        Ok(txn.open_table(RELATIONSHIPS)?.len()?)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Transitive closure
    // ═══════════════════════════════════════════════════════════════════

    /// Rebuilds the IS_A ancestor closure for every stored concept.
    ///
    /// Ancestor sets are computed in parallel chunks and written
    /// serially; the previous closure is dropped first. Returns the
    /// number of `(concept, ancestor)` pairs written.
    pub fn build_transitive_closure(&self) -> StoreResult<usize> {
        let txn = self.db.begin_write()?;
        txn.delete_table(ANCESTORS)?;
        create_all(&txn)?;
        txn.commit()?;

        let ids = self.all_concept_ids()?;
        info!(concepts = ids.len(), "building IS_A transitive closure");

        let mut written = 0;
        for chunk in ids.chunks(CLOSURE_CHUNK) {
            let ancestor_sets: Vec<StoreResult<(SctId, HashSet<SctId>)>> = chunk
                .par_iter()
                .map(|&id| self.walk_ancestors(id).map(|set| (id, set)))
                .collect();

            let txn = self.db.begin_write()?;
            {
                let mut table = txn.open_table(ANCESTORS)?;
                for result in ancestor_sets {
                    let (id, ancestors) = result?;
                    for ancestor in ancestors {
                        table.insert((id, ancestor), ())?;
                        written += 1;
                    }
                }
            }
            txn.commit()?;
        }

        info!(pairs = written, "transitive closure complete");
        Ok(written)
    }

    /// Breadth-first walk over active IS_A edges, self excluded.
    fn walk_ancestors(&self, concept_id: SctId) -> StoreResult<HashSet<SctId>> {
        let txn = self.db.begin_read()?;
        let parents = txn.open_table(PARENTS)?;
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([concept_id]);
        while let Some(current) = queue.pop_front() {
            for entry in parents
                .range((current, well_known::IS_A, 0u64)..=(current, well_known::IS_A, u64::MAX))?
            {
                let (key, _) = entry?;
                let parent = key.value().2;
                if seen.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
        seen.remove(&concept_id);
        Ok(seen)
    }
}

/// The max-effective-time rule: keep the incoming record when there is
/// no stored version or the incoming date is not older. Equal dates let
/// the later write win.
fn keeps(existing: Option<u32>, incoming: u32) -> bool {
    match existing {
        Some(stored) => incoming >= stored,
        None => true,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use snomed_types::{CharacteristicType, DefinitionStatus, DescriptionType};

    fn store() -> (tempfile::TempDir, SnomedStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SnomedStore::open(dir.path().join("store.db")).unwrap();
        (dir, store)
    }

    pub(crate) fn concept(id: SctId) -> Concept {
        Concept {
            id,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            definition_status_id: DefinitionStatus::PRIMITIVE_ID,
        }
    }

    pub(crate) fn is_a(id: SctId, source: SctId, destination: SctId) -> Relationship {
        relationship(id, source, destination, well_known::IS_A)
    }

    pub(crate) fn relationship(
        id: SctId,
        source: SctId,
        destination: SctId,
        type_id: SctId,
    ) -> Relationship {
        Relationship {
            id,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            source_id: source,
            destination_id: destination,
            relationship_group: 0,
            type_id,
            characteristic_type_id: CharacteristicType::INFERRED_ID,
            modifier_id: 900000000000451002,
        }
    }

    pub(crate) fn description(id: SctId, concept_id: SctId, term: &str) -> Description {
        Description {
            id,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            concept_id,
            language_code: "en".to_string(),
            type_id: DescriptionType::SYNONYM_ID,
            term: term.to_string(),
            case_significance_id: 900000000000448009,
        }
    }

    /// root <- finding <- { ms <- rrms, mi }
    pub(crate) fn hierarchy(store: &SnomedStore) {
        store
            .insert_concepts([
                concept(138875005),
                concept(404684003),
                concept(24700007),
                concept(426373005),
                concept(22298006),
            ])
            .unwrap();
        store
            .insert_relationships([
                is_a(1, 404684003, 138875005),
                is_a(2, 24700007, 404684003),
                is_a(3, 426373005, 24700007),
                is_a(4, 22298006, 404684003),
            ])
            .unwrap();
        store.build_transitive_closure().unwrap();
    }

    #[test]
    fn test_max_effective_time_merge() {
        let (_dir, store) = store();
        let newer = Concept { effective_time: 20230131, active: false, ..concept(24700007) };

        // Newer first, older replayed after: the older must not win.
        store.insert_concepts([newer.clone()]).unwrap();
        store.insert_concepts([concept(24700007)]).unwrap();
        assert_eq!(store.get_concept(24700007).unwrap().unwrap(), newer);

        // Equal dates: later write wins.
        let flipped = Concept { active: true, ..newer.clone() };
        store.insert_concepts([flipped.clone()]).unwrap();
        assert_eq!(store.get_concept(24700007).unwrap().unwrap(), flipped);
    }

    #[test]
    fn test_missing_component_is_none() {
        let (_dir, store) = store();
        assert!(store.get_concept(24700007).unwrap().is_none());
        assert!(store.get_description(24700007).unwrap().is_none());
    }

    #[test]
    fn test_hierarchy_traversal() {
        let (_dir, store) = store();
        hierarchy(&store);

        assert_eq!(store.get_parents(24700007).unwrap(), vec![404684003]);
        let children = store.get_children(404684003).unwrap();
        assert_eq!(children.len(), 2);
        assert!(children.contains(&24700007));
        assert!(children.contains(&22298006));

        let ancestors = store.all_ancestors(426373005).unwrap();
        assert_eq!(ancestors, HashSet::from([24700007, 404684003, 138875005]));
        assert!(!ancestors.contains(&426373005));

        let descendants = store.all_descendants(404684003).unwrap();
        assert_eq!(descendants, HashSet::from([24700007, 426373005, 22298006]));
    }

    #[test]
    fn test_children_are_descendants() {
        let (_dir, store) = store();
        hierarchy(&store);
        for id in [138875005, 404684003, 24700007] {
            let children: HashSet<SctId> =
                store.get_children(id).unwrap().into_iter().collect();
            let descendants = store.all_descendants(id).unwrap();
            assert!(children.is_subset(&descendants));
            assert!(children.len() <= descendants.len());
        }
    }

    #[test]
    fn test_inactivating_relationship_removes_edges() {
        let (_dir, store) = store();
        hierarchy(&store);

        let retired =
            Relationship { effective_time: 20230131, active: false, ..is_a(3, 426373005, 24700007) };
        store.insert_relationships([retired]).unwrap();
        store.build_transitive_closure().unwrap();

        assert!(store.get_parents(426373005).unwrap().is_empty());
        assert!(store.all_ancestors(426373005).unwrap().is_empty());
        assert!(!store.all_descendants(24700007).unwrap().contains(&426373005));
    }

    #[test]
    fn test_top_and_bottom_of_set() {
        let (_dir, store) = store();
        hierarchy(&store);

        let set = HashSet::from([404684003, 24700007, 426373005]);
        assert_eq!(store.top_of_set(&set).unwrap(), HashSet::from([404684003]));
        assert_eq!(store.bottom_of_set(&set).unwrap(), HashSet::from([426373005]));

        // Incomparable members are both top and bottom.
        let siblings = HashSet::from([24700007, 22298006]);
        assert_eq!(store.top_of_set(&siblings).unwrap(), siblings);
        assert_eq!(store.bottom_of_set(&siblings).unwrap(), siblings);
    }

    #[test]
    fn test_expanded_parent_relationships() {
        let (_dir, store) = store();
        // Attribute hierarchy: 762705008 (has some attribute) <- 363698007
        store
            .insert_concepts([concept(762705008), concept(363698007), concept(24700007)])
            .unwrap();
        store
            .insert_relationships([
                is_a(10, 363698007, 762705008),
                relationship(11, 24700007, 39057004, 363698007),
            ])
            .unwrap();
        store.build_transitive_closure().unwrap();

        // Querying the supertype finds destinations via the subtype.
        let expanded =
            store.get_parent_relationships_expanded(24700007, &[762705008]).unwrap();
        assert_eq!(expanded, HashSet::from([39057004]));
    }
}
