//! # snomed-types
//!
//! Type definitions for SNOMED CT clinical terminology.
//!
//! This crate provides the component records of a Release Format 2 (RF2)
//! snapshot — concepts, descriptions, relationships, concrete-value
//! relationships and the reference-set member family — together with
//! SCTID structure helpers (partition codes and Verhoeff check digits),
//! coded-value enums, well-known identifiers and the denormalized
//! [`ExtendedConcept`] view the search indexer consumes.
//!
//! ## Features
//!
//! - `serde` (default): serialization support for every record type.
//!
//! ## Usage
//!
//! ```rust
//! use snomed_types::{identifier, well_known, Concept, DefinitionStatus, SctId};
//!
//! let concept = Concept {
//!     id: 73211009,
//!     effective_time: 20020131,
//!     active: true,
//!     module_id: 900000000000207008,
//!     definition_status_id: DefinitionStatus::FULLY_DEFINED_ID,
//! };
//!
//! assert!(identifier::verhoeff_valid(concept.id));
//! let is_a: SctId = well_known::IS_A;
//! assert_eq!(is_a, 116680003);
//! ```

#![warn(missing_docs)]

mod concept;
mod concrete;
mod description;
mod enums;
mod extended;
pub mod identifier;
pub mod refset;
mod relationship;
pub mod well_known;

pub use concept::Concept;
pub use concrete::{ConcreteRelationship, ConcreteValue};
pub use description::Description;
pub use enums::{
    Acceptability, CaseSignificance, CharacteristicType, DefinitionStatus, DescriptionType,
};
pub use extended::{ExtendedConcept, TypedConcreteValue};
pub use identifier::{ComponentKind, SctId};
pub use refset::{RefsetField, RefsetHeader, RefsetItem, RefsetKind};
pub use relationship::Relationship;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_are_exported() {
        let _id: SctId = 73211009;
        let _status = DefinitionStatus::Primitive;
        let _desc_type = DescriptionType::Fsn;
        let _case = CaseSignificance::EntireTermCaseInsensitive;
        let _kind = ComponentKind::Concept;
        let _acceptability = Acceptability::Preferred;
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_concept_serde_round_trip() {
        let concept = Concept {
            id: 404684003,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            definition_status_id: 900000000000074008,
        };

        let json = serde_json::to_string(&concept).unwrap();
        let parsed: Concept = serde_json::from_str(&json).unwrap();
        assert_eq!(concept, parsed);
    }
}
