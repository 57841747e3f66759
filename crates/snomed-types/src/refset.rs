//! SNOMED CT reference-set member types.
//!
//! Reference sets group components for subsets, language preferences,
//! maps and metadata. All member shapes share six header fields; the
//! remaining columns vary per refset and are described by a field
//! pattern (`c` = SCTID, `i` = integer, `s` = string) derived from the
//! release file name.
//!
//! The concrete shapes are modelled as a closed enum ([`RefsetItem`])
//! rather than an open hierarchy; rows whose shape is not recognized
//! are retained as [`RefsetItem::Generic`] with their typed field
//! vector.

use uuid::Uuid;

use crate::{Acceptability, SctId};

/// The six fields every reference-set member carries.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RefsetHeader {
    /// Member identifier (UUID, not an SCTID).
    pub id: Uuid,
    /// Effective date in YYYYMMDD format.
    pub effective_time: u32,
    /// Whether this membership is active.
    pub active: bool,
    /// The module containing this member.
    pub module_id: SctId,
    /// The reference set this member belongs to.
    pub refset_id: SctId,
    /// The component (concept or description) that is a member.
    pub referenced_component_id: SctId,
}

/// A typed extra field of a generic reference-set row.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefsetField {
    /// A component reference (pattern character `c`).
    ConceptId(SctId),
    /// A signed integer (pattern character `i`).
    Integer(i64),
    /// A string (pattern character `s`).
    String(String),
}

impl RefsetField {
    /// Returns the SCTID if this field is a component reference.
    pub fn as_concept_id(&self) -> Option<SctId> {
        match self {
            RefsetField::ConceptId(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the integer value if this field is an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RefsetField::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the string if this field is a string.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            RefsetField::String(s) => Some(s),
            _ => None,
        }
    }
}

/// The recognized reference-set shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefsetKind {
    /// Membership only, no extra fields.
    Simple,
    /// One component reference: `targetComponentId`.
    Association,
    /// One component reference: `acceptabilityId`.
    Language,
    /// One string: `mapTarget`.
    SimpleMap,
    /// `mapGroup, mapPriority, mapRule, mapAdvice, mapTarget, correlationId`.
    ComplexMap,
    /// Complex map plus `mapCategoryId`.
    ExtendedMap,
    /// One component reference: `valueId`.
    AttributeValue,
    /// One string: `owlExpression`.
    OwlExpression,
    /// Two dates: `sourceEffectiveTime, targetEffectiveTime`.
    ModuleDependency,
    /// `attributeDescriptionId, attributeTypeId, attributeOrder`.
    RefsetDescriptor,
}

/// A reference-set member of any recognized or generic shape.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefsetItem {
    /// Plain membership.
    Simple {
        /// Shared header fields.
        header: RefsetHeader,
    },
    /// Historical or similarity association between two components.
    Association {
        /// Shared header fields.
        header: RefsetHeader,
        /// The associated target component.
        target_component_id: SctId,
    },
    /// Preferred/acceptable marking of a description in a dialect.
    Language {
        /// Shared header fields.
        header: RefsetHeader,
        /// Preferred or Acceptable.
        acceptability_id: SctId,
    },
    /// Map to a single code in an external code system.
    SimpleMap {
        /// Shared header fields.
        header: RefsetHeader,
        /// The target code.
        map_target: String,
    },
    /// Rule-based map to an external code system.
    ComplexMap {
        /// Shared header fields.
        header: RefsetHeader,
        /// Group of rules this entry belongs to.
        map_group: i64,
        /// Priority of this entry within its group.
        map_priority: i64,
        /// Machine-readable map rule.
        map_rule: String,
        /// Human-readable mapping advice.
        map_advice: String,
        /// The target code.
        map_target: String,
        /// Correlation between source and target.
        correlation_id: SctId,
    },
    /// Complex map with an additional map category (e.g. ICD-10 maps).
    ExtendedMap {
        /// Shared header fields.
        header: RefsetHeader,
        /// Group of rules this entry belongs to.
        map_group: i64,
        /// Priority of this entry within its group.
        map_priority: i64,
        /// Machine-readable map rule.
        map_rule: String,
        /// Human-readable mapping advice.
        map_advice: String,
        /// The target code.
        map_target: String,
        /// Correlation between source and target.
        correlation_id: SctId,
        /// Categorization of the map entry.
        map_category_id: SctId,
    },
    /// Attribute value attached to a component (e.g. inactivation reason).
    AttributeValue {
        /// Shared header fields.
        header: RefsetHeader,
        /// The attached value concept.
        value_id: SctId,
    },
    /// OWL axiom or ontology expression.
    OwlExpression {
        /// Shared header fields.
        header: RefsetHeader,
        /// The OWL functional-syntax expression.
        owl_expression: String,
    },
    /// Module dependency metadata.
    ModuleDependency {
        /// Shared header fields.
        header: RefsetHeader,
        /// Effective time of the depending module version.
        source_effective_time: u32,
        /// Effective time of the depended-on module version.
        target_effective_time: u32,
    },
    /// Refset descriptor: declares the columns of another refset.
    RefsetDescriptor {
        /// Shared header fields.
        header: RefsetHeader,
        /// Attribute-description concept for the declared column.
        attribute_description_id: SctId,
        /// Attribute-type concept for the declared column.
        attribute_type_id: SctId,
        /// Zero-based column order.
        attribute_order: i64,
    },
    /// Unrecognized shape, retained with its typed field vector.
    Generic {
        /// Shared header fields.
        header: RefsetHeader,
        /// Extra fields in column order.
        fields: Vec<RefsetField>,
    },
}

impl RefsetItem {
    /// The shared header fields.
    pub fn header(&self) -> &RefsetHeader {
        match self {
            RefsetItem::Simple { header }
            | RefsetItem::Association { header, .. }
            | RefsetItem::Language { header, .. }
            | RefsetItem::SimpleMap { header, .. }
            | RefsetItem::ComplexMap { header, .. }
            | RefsetItem::ExtendedMap { header, .. }
            | RefsetItem::AttributeValue { header, .. }
            | RefsetItem::OwlExpression { header, .. }
            | RefsetItem::ModuleDependency { header, .. }
            | RefsetItem::RefsetDescriptor { header, .. }
            | RefsetItem::Generic { header, .. } => header,
        }
    }

    /// The shape of this member, or `None` for generic rows.
    pub fn kind(&self) -> Option<RefsetKind> {
        match self {
            RefsetItem::Simple { .. } => Some(RefsetKind::Simple),
            RefsetItem::Association { .. } => Some(RefsetKind::Association),
            RefsetItem::Language { .. } => Some(RefsetKind::Language),
            RefsetItem::SimpleMap { .. } => Some(RefsetKind::SimpleMap),
            RefsetItem::ComplexMap { .. } => Some(RefsetKind::ComplexMap),
            RefsetItem::ExtendedMap { .. } => Some(RefsetKind::ExtendedMap),
            RefsetItem::AttributeValue { .. } => Some(RefsetKind::AttributeValue),
            RefsetItem::OwlExpression { .. } => Some(RefsetKind::OwlExpression),
            RefsetItem::ModuleDependency { .. } => Some(RefsetKind::ModuleDependency),
            RefsetItem::RefsetDescriptor { .. } => Some(RefsetKind::RefsetDescriptor),
            RefsetItem::Generic { .. } => None,
        }
    }

    /// Returns true if this member is a language-refset entry marking
    /// its description as preferred.
    pub fn is_preferred(&self) -> bool {
        matches!(
            self,
            RefsetItem::Language { acceptability_id, .. }
                if *acceptability_id == Acceptability::PREFERRED_ID
        )
    }

    /// The map target, for simple, complex and extended maps.
    pub fn map_target(&self) -> Option<&str> {
        match self {
            RefsetItem::SimpleMap { map_target, .. }
            | RefsetItem::ComplexMap { map_target, .. }
            | RefsetItem::ExtendedMap { map_target, .. } => Some(map_target),
            _ => None,
        }
    }

    /// The association target, for association members.
    pub fn target_component_id(&self) -> Option<SctId> {
        match self {
            RefsetItem::Association { target_component_id, .. } => Some(*target_component_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(refset_id: SctId) -> RefsetHeader {
        RefsetHeader {
            id: Uuid::nil(),
            effective_time: 20200101,
            active: true,
            module_id: 900000000000207008,
            refset_id,
            referenced_component_id: 24700007,
        }
    }

    #[test]
    fn test_header_accessor_covers_all_variants() {
        let items = [
            RefsetItem::Simple { header: header(1) },
            RefsetItem::Language { header: header(2), acceptability_id: Acceptability::PREFERRED_ID },
            RefsetItem::SimpleMap { header: header(3), map_target: "G35".to_string() },
            RefsetItem::Generic { header: header(4), fields: vec![RefsetField::Integer(7)] },
        ];
        for (i, item) in items.iter().enumerate() {
            assert_eq!(item.header().refset_id, i as u64 + 1);
        }
    }

    #[test]
    fn test_is_preferred() {
        let preferred = RefsetItem::Language {
            header: header(900000000000508004),
            acceptability_id: Acceptability::PREFERRED_ID,
        };
        let acceptable = RefsetItem::Language {
            header: header(900000000000508004),
            acceptability_id: Acceptability::ACCEPTABLE_ID,
        };
        assert!(preferred.is_preferred());
        assert!(!acceptable.is_preferred());
    }

    #[test]
    fn test_map_target() {
        let item = RefsetItem::ExtendedMap {
            header: header(447562003),
            map_group: 1,
            map_priority: 1,
            map_rule: "TRUE".to_string(),
            map_advice: "ALWAYS G35.9".to_string(),
            map_target: "G35.9".to_string(),
            correlation_id: 447561005,
            map_category_id: 447637006,
        };
        assert_eq!(item.map_target(), Some("G35.9"));
        assert_eq!(item.kind(), Some(RefsetKind::ExtendedMap));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_round_trip() {
        let item = RefsetItem::Language {
            header: header(900000000000509007),
            acceptability_id: Acceptability::ACCEPTABLE_ID,
        };
        let json = serde_json::to_string(&item).unwrap();
        let parsed: RefsetItem = serde_json::from_str(&json).unwrap();
        assert_eq!(item, parsed);
    }
}
