//! SNOMED CT Concept type.

use crate::{DefinitionStatus, SctId};

/// A SNOMED CT concept, as released in `sct2_Concept_*.txt` files.
///
/// Concepts are immutable: a later release replaces a concept by shipping a
/// row with the same `id` and a greater `effective_time`.
///
/// # Examples
///
/// ```
/// use snomed_types::{Concept, DefinitionStatus};
///
/// let concept = Concept {
///     id: 73211009,
///     effective_time: 20020131,
///     active: true,
///     module_id: 900000000000207008,
///     definition_status_id: DefinitionStatus::PRIMITIVE_ID,
/// };
///
/// assert!(concept.is_primitive());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Concept {
    /// Unique identifier (SCTID, concept partition).
    pub id: SctId,
    /// Effective date in YYYYMMDD format.
    pub effective_time: u32,
    /// Whether this concept is active.
    pub active: bool,
    /// The module containing this concept.
    pub module_id: SctId,
    /// Primitive or fully defined.
    pub definition_status_id: SctId,
}

impl Concept {
    /// Returns the definition status enum value, or `None` if unrecognized.
    pub fn definition_status(&self) -> Option<DefinitionStatus> {
        DefinitionStatus::from_id(self.definition_status_id)
    }

    /// Returns true if this concept is primitively defined.
    pub fn is_primitive(&self) -> bool {
        self.definition_status_id == DefinitionStatus::PRIMITIVE_ID
    }

    /// Returns true if this concept is fully defined.
    pub fn is_fully_defined(&self) -> bool {
        self.definition_status_id == DefinitionStatus::FULLY_DEFINED_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concept_helpers() {
        let concept = Concept {
            id: 404684003,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            definition_status_id: DefinitionStatus::PRIMITIVE_ID,
        };

        assert!(concept.is_primitive());
        assert!(!concept.is_fully_defined());
        assert_eq!(concept.definition_status(), Some(DefinitionStatus::Primitive));
    }
}
