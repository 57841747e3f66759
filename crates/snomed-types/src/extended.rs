//! Denormalized concept view.
//!
//! An [`ExtendedConcept`] gathers everything the search indexer and the
//! lookup API need about one concept: its descriptions, its direct and
//! transitive parents per relationship type, its refset memberships and
//! its concrete values. It is derived from the store after ingestion,
//! never persisted raw.

use std::collections::{HashMap, HashSet};

use crate::{Concept, ConcreteValue, Description, SctId};

/// A concrete value together with its attribute type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypedConcreteValue {
    /// The attribute type concept.
    pub type_id: SctId,
    /// The parsed value.
    pub value: ConcreteValue,
}

/// A concept denormalized with its descriptions, parents, refsets and
/// concrete values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtendedConcept {
    /// The concept record itself.
    pub concept: Concept,
    /// All descriptions of the concept.
    pub descriptions: Vec<Description>,
    /// Per relationship type, the transitive destination set: each direct
    /// destination together with all of its IS_A ancestors.
    pub parent_relationships: HashMap<SctId, HashSet<SctId>>,
    /// Per relationship type, the direct destination set.
    pub direct_parent_relationships: HashMap<SctId, HashSet<SctId>>,
    /// Reference sets the concept is a member of.
    pub refsets: HashSet<SctId>,
    /// Concrete values attached to the concept.
    pub concrete_values: Vec<TypedConcreteValue>,
}

impl ExtendedConcept {
    /// Direct parents for one relationship type.
    pub fn direct_parents_of_type(&self, type_id: SctId) -> Option<&HashSet<SctId>> {
        self.direct_parent_relationships.get(&type_id)
    }

    /// Transitive parents for one relationship type.
    pub fn parents_of_type(&self, type_id: SctId) -> Option<&HashSet<SctId>> {
        self.parent_relationships.get(&type_id)
    }

    /// All active synonyms, in description order.
    pub fn synonyms(&self) -> impl Iterator<Item = &Description> {
        self.descriptions.iter().filter(|d| d.active && d.is_synonym())
    }

    /// The first active FSN, if any.
    pub fn fsn(&self) -> Option<&Description> {
        self.descriptions.iter().find(|d| d.active && d.is_fsn())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DefinitionStatus, DescriptionType};

    fn extended() -> ExtendedConcept {
        let concept = Concept {
            id: 24700007,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            definition_status_id: DefinitionStatus::FULLY_DEFINED_ID,
        };
        let fsn = Description {
            id: 41398015,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            concept_id: 24700007,
            language_code: "en".to_string(),
            type_id: DescriptionType::FSN_ID,
            term: "Multiple sclerosis (disorder)".to_string(),
            case_significance_id: 900000000000448009,
        };
        let synonym = Description {
            id: 41399011,
            type_id: DescriptionType::SYNONYM_ID,
            term: "Multiple sclerosis".to_string(),
            ..fsn.clone()
        };
        ExtendedConcept {
            concept,
            descriptions: vec![fsn, synonym],
            parent_relationships: HashMap::from([(
                crate::well_known::IS_A,
                HashSet::from([6118003, 138875005]),
            )]),
            direct_parent_relationships: HashMap::from([(
                crate::well_known::IS_A,
                HashSet::from([6118003]),
            )]),
            refsets: HashSet::new(),
            concrete_values: Vec::new(),
        }
    }

    #[test]
    fn test_fsn_and_synonyms() {
        let ec = extended();
        assert_eq!(ec.fsn().unwrap().term, "Multiple sclerosis (disorder)");
        let synonyms: Vec<_> = ec.synonyms().map(|d| d.term.as_str()).collect();
        assert_eq!(synonyms, vec!["Multiple sclerosis"]);
    }

    #[test]
    fn test_parent_accessors() {
        let ec = extended();
        let direct = ec.direct_parents_of_type(crate::well_known::IS_A).unwrap();
        let transitive = ec.parents_of_type(crate::well_known::IS_A).unwrap();
        assert!(direct.is_subset(transitive));
        assert!(transitive.contains(&138875005));
    }
}
