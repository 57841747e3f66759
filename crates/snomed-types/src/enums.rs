//! Enumerations for SNOMED CT coded values.
//!
//! Each enum pairs its variants with the SCTIDs used in RF2 files and
//! offers `from_id`/`to_id` conversions.

use crate::SctId;

/// Definition status of a concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DefinitionStatus {
    /// Necessary conditions only.
    Primitive,
    /// Necessary and sufficient conditions.
    FullyDefined,
}

impl DefinitionStatus {
    /// SCTID for primitive definition status.
    pub const PRIMITIVE_ID: SctId = 900000000000074008;
    /// SCTID for fully defined definition status.
    pub const FULLY_DEFINED_ID: SctId = 900000000000073002;

    /// Creates a DefinitionStatus from its SCTID.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::PRIMITIVE_ID => Some(Self::Primitive),
            Self::FULLY_DEFINED_ID => Some(Self::FullyDefined),
            _ => None,
        }
    }

    /// Returns the SCTID for this definition status.
    pub fn to_id(self) -> SctId {
        match self {
            Self::Primitive => Self::PRIMITIVE_ID,
            Self::FullyDefined => Self::FULLY_DEFINED_ID,
        }
    }
}

/// Type of a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DescriptionType {
    /// Fully Specified Name, unique per language refset.
    Fsn,
    /// Alternative term; one per language refset is marked preferred.
    Synonym,
    /// Textual definition.
    Definition,
}

impl DescriptionType {
    /// SCTID for Fully Specified Name.
    pub const FSN_ID: SctId = 900000000000003001;
    /// SCTID for Synonym.
    pub const SYNONYM_ID: SctId = 900000000000013009;
    /// SCTID for Definition.
    pub const DEFINITION_ID: SctId = 900000000000550004;

    /// Creates a DescriptionType from its SCTID.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::FSN_ID => Some(Self::Fsn),
            Self::SYNONYM_ID => Some(Self::Synonym),
            Self::DEFINITION_ID => Some(Self::Definition),
            _ => None,
        }
    }

    /// Returns the SCTID for this description type.
    pub fn to_id(self) -> SctId {
        match self {
            Self::Fsn => Self::FSN_ID,
            Self::Synonym => Self::SYNONYM_ID,
            Self::Definition => Self::DEFINITION_ID,
        }
    }
}

/// Case significance rule for a description term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CaseSignificance {
    /// Only the first character may be case-folded.
    InitialCharacterCaseInsensitive,
    /// The whole term may be case-folded.
    EntireTermCaseInsensitive,
    /// The term must be preserved verbatim.
    EntireTermCaseSensitive,
}

impl CaseSignificance {
    /// SCTID for "initial character case insensitive".
    pub const INITIAL_CHAR_CASE_INSENSITIVE_ID: SctId = 900000000000020002;
    /// SCTID for "entire term case insensitive".
    pub const ENTIRE_TERM_CASE_INSENSITIVE_ID: SctId = 900000000000448009;
    /// SCTID for "entire term case sensitive".
    pub const ENTIRE_TERM_CASE_SENSITIVE_ID: SctId = 900000000000017005;

    /// Creates a CaseSignificance from its SCTID.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::INITIAL_CHAR_CASE_INSENSITIVE_ID => Some(Self::InitialCharacterCaseInsensitive),
            Self::ENTIRE_TERM_CASE_INSENSITIVE_ID => Some(Self::EntireTermCaseInsensitive),
            Self::ENTIRE_TERM_CASE_SENSITIVE_ID => Some(Self::EntireTermCaseSensitive),
            _ => None,
        }
    }

    /// Returns the SCTID for this case significance.
    pub fn to_id(self) -> SctId {
        match self {
            Self::InitialCharacterCaseInsensitive => Self::INITIAL_CHAR_CASE_INSENSITIVE_ID,
            Self::EntireTermCaseInsensitive => Self::ENTIRE_TERM_CASE_INSENSITIVE_ID,
            Self::EntireTermCaseSensitive => Self::ENTIRE_TERM_CASE_SENSITIVE_ID,
        }
    }
}

/// Characteristic type of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CharacteristicType {
    /// As authored.
    Stated,
    /// Computed by a classifier.
    Inferred,
    /// Additional (non-defining).
    Additional,
}

impl CharacteristicType {
    /// SCTID for stated relationships.
    pub const STATED_ID: SctId = 900000000000010007;
    /// SCTID for inferred relationships.
    pub const INFERRED_ID: SctId = 900000000000011006;
    /// SCTID for additional relationships.
    pub const ADDITIONAL_ID: SctId = 900000000000227009;

    /// Creates a CharacteristicType from its SCTID.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::STATED_ID => Some(Self::Stated),
            Self::INFERRED_ID => Some(Self::Inferred),
            Self::ADDITIONAL_ID => Some(Self::Additional),
            _ => None,
        }
    }

    /// Returns the SCTID for this characteristic type.
    pub fn to_id(self) -> SctId {
        match self {
            Self::Stated => Self::STATED_ID,
            Self::Inferred => Self::INFERRED_ID,
            Self::Additional => Self::ADDITIONAL_ID,
        }
    }
}

/// Acceptability of a description within a language refset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Acceptability {
    /// The preferred term in the dialect.
    Preferred,
    /// An acceptable alternative.
    Acceptable,
}

impl Acceptability {
    /// SCTID for preferred acceptability.
    pub const PREFERRED_ID: SctId = 900000000000548007;
    /// SCTID for acceptable acceptability.
    pub const ACCEPTABLE_ID: SctId = 900000000000549004;

    /// Creates an Acceptability from its SCTID.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::PREFERRED_ID => Some(Self::Preferred),
            Self::ACCEPTABLE_ID => Some(Self::Acceptable),
            _ => None,
        }
    }

    /// Returns the SCTID for this acceptability.
    pub fn to_id(self) -> SctId {
        match self {
            Self::Preferred => Self::PREFERRED_ID,
            Self::Acceptable => Self::ACCEPTABLE_ID,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_status_round_trip() {
        assert_eq!(
            DefinitionStatus::from_id(900000000000074008),
            Some(DefinitionStatus::Primitive)
        );
        assert_eq!(DefinitionStatus::Primitive.to_id(), 900000000000074008);
        assert_eq!(DefinitionStatus::from_id(12345), None);
    }

    #[test]
    fn test_description_type_round_trip() {
        assert_eq!(DescriptionType::from_id(900000000000003001), Some(DescriptionType::Fsn));
        assert_eq!(
            DescriptionType::from_id(900000000000013009),
            Some(DescriptionType::Synonym)
        );
        assert_eq!(DescriptionType::Definition.to_id(), 900000000000550004);
    }

    #[test]
    fn test_case_significance_round_trip() {
        assert_eq!(
            CaseSignificance::from_id(900000000000020002),
            Some(CaseSignificance::InitialCharacterCaseInsensitive)
        );
        assert_eq!(
            CaseSignificance::from_id(900000000000017005),
            Some(CaseSignificance::EntireTermCaseSensitive)
        );
    }

    #[test]
    fn test_acceptability_round_trip() {
        assert_eq!(Acceptability::from_id(900000000000548007), Some(Acceptability::Preferred));
        assert_eq!(Acceptability::from_id(900000000000549004), Some(Acceptability::Acceptable));
        assert_eq!(Acceptability::Preferred.to_id(), 900000000000548007);
    }
}
