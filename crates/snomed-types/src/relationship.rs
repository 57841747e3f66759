//! SNOMED CT Relationship type.

use crate::{well_known, CharacteristicType, SctId};

/// A SNOMED CT relationship, as released in `sct2_Relationship_*.txt` and
/// `sct2_StatedRelationship_*.txt` files.
///
/// A relationship asserts `source_id -[type_id]-> destination_id`;
/// IS_A relationships (`type_id = 116680003`) form the subsumption
/// hierarchy, all other types are defining attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Relationship {
    /// Unique identifier (SCTID, relationship partition).
    pub id: SctId,
    /// Effective date in YYYYMMDD format.
    pub effective_time: u32,
    /// Whether this relationship is active.
    pub active: bool,
    /// The module containing this relationship.
    pub module_id: SctId,
    /// Source concept.
    pub source_id: SctId,
    /// Destination concept.
    pub destination_id: SctId,
    /// Relationship group (0 = ungrouped).
    pub relationship_group: u32,
    /// Relationship type concept.
    pub type_id: SctId,
    /// Stated or inferred.
    pub characteristic_type_id: SctId,
    /// Existential or universal quantification.
    pub modifier_id: SctId,
}

impl Relationship {
    /// Returns true if this is an IS_A (subsumption) relationship.
    pub fn is_is_a(&self) -> bool {
        self.type_id == well_known::IS_A
    }

    /// Returns true if this relationship was inferred by a classifier.
    pub fn is_inferred(&self) -> bool {
        self.characteristic_type_id == CharacteristicType::INFERRED_ID
    }

    /// Returns true if this relationship was stated by an author.
    pub fn is_stated(&self) -> bool {
        self.characteristic_type_id == CharacteristicType::STATED_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_helpers() {
        let rel = Relationship {
            id: 3187444026,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            source_id: 73211009,
            destination_id: 404684003,
            relationship_group: 0,
            type_id: well_known::IS_A,
            characteristic_type_id: CharacteristicType::INFERRED_ID,
            modifier_id: 900000000000451002,
        };

        assert!(rel.is_is_a());
        assert!(rel.is_inferred());
        assert!(!rel.is_stated());
    }
}
