//! Well-known SNOMED CT concept identifiers.
//!
//! Constants for the concepts the server special-cases: the hierarchy
//! root, description and relationship metadata, acceptabilities,
//! historical-association refsets and the common language refsets.

use crate::SctId;

// =============================================================================
// Roots and relationship types
// =============================================================================

/// SNOMED CT root concept - 138875005.
pub const SNOMED_CT_ROOT: SctId = 138875005;

/// IS_A relationship type - 116680003.
pub const IS_A: SctId = 116680003;

/// Clinical finding (finding) - 404684003.
pub const CLINICAL_FINDING: SctId = 404684003;

/// Associated morphology attribute - 116676008.
pub const ASSOCIATED_MORPHOLOGY: SctId = 116676008;

/// Finding site attribute - 363698007.
pub const FINDING_SITE: SctId = 363698007;

// =============================================================================
// Description metadata
// =============================================================================

/// Fully Specified Name description type - 900000000000003001.
pub const FULLY_SPECIFIED_NAME: SctId = 900000000000003001;

/// Synonym description type - 900000000000013009.
pub const SYNONYM: SctId = 900000000000013009;

/// Preferred acceptability - 900000000000548007.
pub const PREFERRED: SctId = 900000000000548007;

/// Acceptable acceptability - 900000000000549004.
pub const ACCEPTABLE: SctId = 900000000000549004;

// =============================================================================
// Language reference sets
// =============================================================================

/// GB English language reference set - 900000000000508004.
pub const GB_ENGLISH: SctId = 900000000000508004;

/// US English language reference set - 900000000000509007.
pub const US_ENGLISH: SctId = 900000000000509007;

// =============================================================================
// Historical association reference sets
// =============================================================================

/// REPLACED BY association - 900000000000526001.
pub const REPLACED_BY: SctId = 900000000000526001;

/// SAME AS association - 900000000000527005.
pub const SAME_AS: SctId = 900000000000527005;

/// POSSIBLY EQUIVALENT TO association - 900000000000523009.
pub const POSSIBLY_EQUIVALENT_TO: SctId = 900000000000523009;

/// MOVED TO association - 900000000000524003.
pub const MOVED_TO: SctId = 900000000000524003;

/// WAS A association - 900000000000528000.
pub const WAS_A: SctId = 900000000000528000;

/// MOVED FROM association - 900000000000525002.
pub const MOVED_FROM: SctId = 900000000000525002;

/// ALTERNATIVE association - 900000000000530003.
pub const ALTERNATIVE: SctId = 900000000000530003;

/// REFERS TO association - 900000000000531004.
pub const REFERS_TO: SctId = 900000000000531004;

/// Returns true if the refset id names a historical association refset.
pub fn is_historical_association(refset_id: SctId) -> bool {
    matches!(
        refset_id,
        REPLACED_BY
            | SAME_AS
            | POSSIBLY_EQUIVALENT_TO
            | MOVED_TO
            | WAS_A
            | MOVED_FROM
            | ALTERNATIVE
            | REFERS_TO
    )
}

// =============================================================================
// Map reference sets
// =============================================================================

/// CTV3 (Read code) simple map reference set - 900000000000497000.
pub const CTV3_MAP: SctId = 900000000000497000;

/// ICD-10 extended map reference set - 447562003.
pub const ICD10_MAP: SctId = 447562003;

// =============================================================================
// Attribute-description concepts (refset column declarations)
// =============================================================================

/// Referenced component attribute description - 449608002.
pub const REFERENCED_COMPONENT: SctId = 449608002;

/// Target component attribute description - 900000000000533001.
pub const TARGET_COMPONENT: SctId = 900000000000533001;

/// Acceptability attribute description - 900000000000511003.
pub const ACCEPTABILITY_ATTRIBUTE: SctId = 900000000000511003;

/// Map source concept attribute description - 900000000000500006.
pub const MAP_SOURCE: SctId = 900000000000500006;

/// Map target attribute description - 900000000000505001.
pub const MAP_TARGET_ATTRIBUTE: SctId = 900000000000505001;

/// Map group attribute description - 1193546000.
pub const MAP_GROUP_ATTRIBUTE: SctId = 1193546000;

/// Map category attribute description - 609330002.
pub const MAP_CATEGORY_ATTRIBUTE: SctId = 609330002;

/// Attribute value attribute description - 900000000000491004.
pub const VALUE_ATTRIBUTE: SctId = 900000000000491004;

/// OWL expression attribute description - 762677007.
pub const OWL_EXPRESSION_ATTRIBUTE: SctId = 762677007;

/// Module dependency source effective time - 900000000000536009.
pub const SOURCE_EFFECTIVE_TIME_ATTRIBUTE: SctId = 900000000000536009;

/// Module dependency target effective time - 900000000000537000.
pub const TARGET_EFFECTIVE_TIME_ATTRIBUTE: SctId = 900000000000537000;

/// Module dependency refset - 900000000000534007.
pub const MODULE_DEPENDENCY_REFSET: SctId = 900000000000534007;

/// Module dependency marker attribute description - 900000000000535008.
pub const MODULE_DEPENDENCY_ATTRIBUTE: SctId = 900000000000535008;

/// Refset descriptor refset - 900000000000456007.
pub const REFSET_DESCRIPTOR_REFSET: SctId = 900000000000456007;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::verhoeff_valid;

    #[test]
    fn test_historical_association_classification() {
        assert!(is_historical_association(REPLACED_BY));
        assert!(is_historical_association(SAME_AS));
        assert!(!is_historical_association(GB_ENGLISH));
        assert!(!is_historical_association(ICD10_MAP));
    }

    #[test]
    fn test_well_known_ids_have_valid_check_digits() {
        for id in [
            SNOMED_CT_ROOT,
            IS_A,
            CLINICAL_FINDING,
            FULLY_SPECIFIED_NAME,
            SYNONYM,
            PREFERRED,
            ACCEPTABLE,
            GB_ENGLISH,
            US_ENGLISH,
            REPLACED_BY,
            SAME_AS,
            CTV3_MAP,
            ICD10_MAP,
        ] {
            assert!(verhoeff_valid(id), "{id} should carry a valid check digit");
        }
    }
}
