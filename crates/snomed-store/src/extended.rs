//! Extended-concept assembly and locale-aware description lookups.

use std::collections::{HashMap, HashSet};

use snomed_types::{
    Acceptability, Description, ExtendedConcept, RefsetItem, SctId, TypedConcreteValue,
};

use crate::error::StoreResult;
use crate::store::SnomedStore;

impl SnomedStore {
    /// Assembles the denormalized view of a concept: descriptions,
    /// direct and transitive parents per relationship type, refset
    /// memberships and concrete values.
    ///
    /// The transitive set for a type contains each direct destination
    /// together with all of its IS_A ancestors, which is what makes
    /// attribute-value subsumption a single index lookup downstream.
    pub fn extended_concept(&self, concept_id: SctId) -> StoreResult<Option<ExtendedConcept>> {
        let Some(concept) = self.get_concept(concept_id)? else {
            return Ok(None);
        };

        let descriptions = self.get_concept_descriptions(concept_id)?;

        let mut direct: HashMap<SctId, HashSet<SctId>> = HashMap::new();
        for (type_id, destination_id) in self.get_parent_relationships(concept_id)? {
            direct.entry(type_id).or_default().insert(destination_id);
        }

        let mut transitive: HashMap<SctId, HashSet<SctId>> = HashMap::new();
        for (&type_id, destinations) in &direct {
            let mut set = HashSet::new();
            for &destination in destinations {
                set.insert(destination);
                set.extend(self.all_ancestors(destination)?);
            }
            transitive.insert(type_id, set);
        }

        let refsets = self.get_component_refset_ids(concept_id)?;

        let mut concrete_values = Vec::new();
        for relationship in self.get_concrete_relationships(concept_id)? {
            if !relationship.active {
                continue;
            }
            if let Some(value) = relationship.concrete_value() {
                concrete_values.push(TypedConcreteValue { type_id: relationship.type_id, value });
            }
        }

        Ok(Some(ExtendedConcept {
            concept,
            descriptions,
            parent_relationships: transitive,
            direct_parent_relationships: direct,
            refsets,
            concrete_values,
        }))
    }

    /// Language-refset memberships of one description: the refsets in
    /// which it is preferred and those in which it is acceptable.
    pub fn description_acceptability(
        &self,
        description_id: SctId,
    ) -> StoreResult<(Vec<SctId>, Vec<SctId>)> {
        let mut preferred = Vec::new();
        let mut acceptable = Vec::new();
        for item in self.get_component_refset_items(description_id, 0)? {
            let header = item.header();
            if !header.active {
                continue;
            }
            if let RefsetItem::Language { acceptability_id, .. } = item {
                if acceptability_id == Acceptability::PREFERRED_ID {
                    preferred.push(header.refset_id);
                } else if acceptability_id == Acceptability::ACCEPTABLE_ID {
                    acceptable.push(header.refset_id);
                }
            }
        }
        Ok((preferred, acceptable))
    }

    /// The preferred synonym of a concept under a refset priority list,
    /// falling back to the first active synonym when no language refset
    /// matches.
    pub fn preferred_synonym(
        &self,
        concept_id: SctId,
        refsets: &[SctId],
    ) -> StoreResult<Option<Description>> {
        let descriptions = self.get_concept_descriptions(concept_id)?;
        let synonyms: Vec<&Description> =
            descriptions.iter().filter(|d| d.active && d.is_synonym()).collect();

        for &refset_id in refsets {
            for description in &synonyms {
                let items = self.get_component_refset_items(description.id, refset_id)?;
                let preferred_here = items.iter().any(|item| {
                    item.header().active
                        && matches!(
                            item,
                            RefsetItem::Language { acceptability_id, .. }
                                if *acceptability_id == Acceptability::PREFERRED_ID
                        )
                });
                if preferred_here {
                    return Ok(Some((*description).clone()));
                }
            }
        }

        Ok(synonyms.first().map(|d| (*d).clone()))
    }

    /// The first active fully specified name of a concept.
    pub fn fully_specified_name(&self, concept_id: SctId) -> StoreResult<Option<Description>> {
        let descriptions = self.get_concept_descriptions(concept_id)?;
        Ok(descriptions.into_iter().find(|d| d.active && d.is_fsn()))
    }

    /// Installed language refsets, i.e. refsets carrying at least one
    /// language item.
    pub fn installed_language_refsets(&self) -> StoreResult<HashSet<SctId>> {
        // The installed-refset table does not record shapes; probe one
        // member per refset.
        let mut result = HashSet::new();
        for refset_id in self.installed_refsets()? {
            let members = self.refset_member_ids(refset_id)?;
            let is_language = members.iter().take(1).try_fold(false, |_, &member| {
                let items = self.get_component_refset_items(member, refset_id)?;
                StoreResult::Ok(items.iter().any(|i| matches!(i, RefsetItem::Language { .. })))
            })?;
            if is_language {
                result.insert(refset_id);
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snomed_types::{well_known, RefsetHeader};
    use uuid::Uuid;

    fn language_item(n: u128, description_id: SctId, refset_id: SctId, acceptability: SctId) -> RefsetItem {
        RefsetItem::Language {
            header: RefsetHeader {
                id: Uuid::from_u128(n),
                effective_time: 20020131,
                active: true,
                module_id: 900000000000207008,
                refset_id,
                referenced_component_id: description_id,
            },
            acceptability_id: acceptability,
        }
    }

    fn appendectomy_store() -> (tempfile::TempDir, SnomedStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SnomedStore::open(dir.path().join("store.db")).unwrap();
        store.insert_concepts([crate::store::tests::concept(80146002)]).unwrap();

        let gb = crate::store::tests::description(1223979019, 80146002, "Appendicectomy");
        let us = crate::store::tests::description(1223980011, 80146002, "Appendectomy");
        store.insert_descriptions([gb, us]).unwrap();

        store
            .insert_refset_items([
                language_item(1, 1223979019, well_known::GB_ENGLISH, Acceptability::PREFERRED_ID),
                language_item(2, 1223979019, well_known::US_ENGLISH, Acceptability::ACCEPTABLE_ID),
                language_item(3, 1223980011, well_known::US_ENGLISH, Acceptability::PREFERRED_ID),
                language_item(4, 1223980011, well_known::GB_ENGLISH, Acceptability::ACCEPTABLE_ID),
            ])
            .unwrap();
        (dir, store)
    }

    #[test]
    fn test_preferred_synonym_follows_priority() {
        let (_dir, store) = appendectomy_store();
        let gb = store.preferred_synonym(80146002, &[well_known::GB_ENGLISH]).unwrap().unwrap();
        assert_eq!(gb.term, "Appendicectomy");
        let us = store.preferred_synonym(80146002, &[well_known::US_ENGLISH]).unwrap().unwrap();
        assert_eq!(us.term, "Appendectomy");
    }

    #[test]
    fn test_preferred_marking_round_trips() {
        let (_dir, store) = appendectomy_store();
        // For every preferred language item, looking the refset up again
        // returns that same description.
        for (description_id, refset_id) in
            [(1223979019u64, well_known::GB_ENGLISH), (1223980011, well_known::US_ENGLISH)]
        {
            let resolved = store.preferred_synonym(80146002, &[refset_id]).unwrap().unwrap();
            assert_eq!(resolved.id, description_id);
        }
    }

    #[test]
    fn test_preferred_synonym_falls_back_to_any_synonym() {
        let (_dir, store) = appendectomy_store();
        let fallback = store.preferred_synonym(80146002, &[554461000005103]).unwrap().unwrap();
        assert!(fallback.is_synonym());
    }

    #[test]
    fn test_description_acceptability() {
        let (_dir, store) = appendectomy_store();
        let (preferred, acceptable) = store.description_acceptability(1223979019).unwrap();
        assert_eq!(preferred, vec![well_known::GB_ENGLISH]);
        assert_eq!(acceptable, vec![well_known::US_ENGLISH]);
    }

    #[test]
    fn test_installed_language_refsets() {
        let (_dir, store) = appendectomy_store();
        let installed = store.installed_language_refsets().unwrap();
        assert_eq!(installed, HashSet::from([well_known::GB_ENGLISH, well_known::US_ENGLISH]));
    }

    #[test]
    fn test_extended_concept_transitive_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnomedStore::open(dir.path().join("store.db")).unwrap();

        // 40541001 (acute pulmonary oedema) has morphology 4532008
        // (acute oedema), itself a child of 79654002 (oedema).
        store
            .insert_concepts([
                crate::store::tests::concept(40541001),
                crate::store::tests::concept(4532008),
                crate::store::tests::concept(79654002),
            ])
            .unwrap();
        store
            .insert_relationships([
                crate::store::tests::is_a(1, 4532008, 79654002),
                crate::store::tests::relationship(
                    2,
                    40541001,
                    4532008,
                    well_known::ASSOCIATED_MORPHOLOGY,
                ),
            ])
            .unwrap();
        store.build_transitive_closure().unwrap();

        let extended = store.extended_concept(40541001).unwrap().unwrap();
        let direct = &extended.direct_parent_relationships[&well_known::ASSOCIATED_MORPHOLOGY];
        let transitive = &extended.parent_relationships[&well_known::ASSOCIATED_MORPHOLOGY];
        assert_eq!(direct, &HashSet::from([4532008]));
        assert_eq!(transitive, &HashSet::from([4532008, 79654002]));

        assert!(store.extended_concept(73211009).unwrap().is_none());
    }

    #[test]
    fn test_extended_concept_concrete_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnomedStore::open(dir.path().join("store.db")).unwrap();
        store.insert_concepts([crate::store::tests::concept(322236009)]).unwrap();
        store
            .insert_concrete_relationships([snomed_types::ConcreteRelationship {
                id: 9940000026,
                effective_time: 20230131,
                active: true,
                module_id: 900000000000207008,
                source_id: 322236009,
                value: "#500".to_string(),
                relationship_group: 1,
                type_id: 1142135004,
                characteristic_type_id: 900000000000011006,
                modifier_id: 900000000000451002,
            }])
            .unwrap();

        let extended = store.extended_concept(322236009).unwrap().unwrap();
        assert_eq!(extended.concrete_values.len(), 1);
        assert_eq!(extended.concrete_values[0].type_id, 1142135004);
        assert_eq!(extended.concrete_values[0].value.as_number(), Some(500.0));
        assert_eq!(store.concrete_type_ids().unwrap(), vec![(1142135004, true)]);
    }
}
