//! SNOMED CT Description type.

use crate::{CaseSignificance, DescriptionType, SctId};

/// A SNOMED CT description, as released in `sct2_Description_*.txt` files.
///
/// # Examples
///
/// ```
/// use snomed_types::{Description, DescriptionType};
///
/// let description = Description {
///     id: 754786011,
///     effective_time: 20020131,
///     active: true,
///     module_id: 900000000000207008,
///     concept_id: 73211009,
///     language_code: "en".to_string(),
///     type_id: DescriptionType::FSN_ID,
///     term: "Diabetes mellitus (disorder)".to_string(),
///     case_significance_id: 900000000000448009,
/// };
///
/// assert!(description.is_fsn());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Description {
    /// Unique identifier (SCTID, description partition).
    pub id: SctId,
    /// Effective date in YYYYMMDD format.
    pub effective_time: u32,
    /// Whether this description is active.
    pub active: bool,
    /// The module containing this description.
    pub module_id: SctId,
    /// The concept this description labels.
    pub concept_id: SctId,
    /// ISO 639 language code (e.g. "en").
    pub language_code: String,
    /// FSN, Synonym or Definition.
    pub type_id: SctId,
    /// The description text.
    pub term: String,
    /// Case significance rule for this term.
    pub case_significance_id: SctId,
}

impl Description {
    /// Returns the description type enum value, or `None` if unrecognized.
    pub fn description_type(&self) -> Option<DescriptionType> {
        DescriptionType::from_id(self.type_id)
    }

    /// Returns true if this is a Fully Specified Name.
    pub fn is_fsn(&self) -> bool {
        self.type_id == DescriptionType::FSN_ID
    }

    /// Returns true if this is a Synonym.
    pub fn is_synonym(&self) -> bool {
        self.type_id == DescriptionType::SYNONYM_ID
    }

    /// Returns the case significance enum value, or `None` if unrecognized.
    pub fn case_significance(&self) -> Option<CaseSignificance> {
        CaseSignificance::from_id(self.case_significance_id)
    }

    /// Returns the term folded according to its case significance rule.
    ///
    /// * initial character case-insensitive: the first code point is
    ///   lowercased and the rest kept verbatim;
    /// * entire term case-insensitive: the whole term is lowercased;
    /// * case-sensitive (or unrecognized rule): the term is returned
    ///   unchanged.
    pub fn lowercase_term(&self) -> String {
        match self.case_significance() {
            Some(CaseSignificance::InitialCharacterCaseInsensitive) => {
                let mut chars = self.term.chars();
                match chars.next() {
                    Some(first) => first.to_lowercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
            Some(CaseSignificance::EntireTermCaseInsensitive) => self.term.to_lowercase(),
            _ => self.term.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn description(term: &str, case_significance_id: SctId) -> Description {
        Description {
            id: 754786011,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            concept_id: 73211009,
            language_code: "en".to_string(),
            type_id: DescriptionType::SYNONYM_ID,
            term: term.to_string(),
            case_significance_id,
        }
    }

    #[test]
    fn test_lowercase_initial_character() {
        let d = description("Diabetes", CaseSignificance::INITIAL_CHAR_CASE_INSENSITIVE_ID);
        assert_eq!(d.lowercase_term(), "diabetes");

        let d = description("Von Willebrand", CaseSignificance::INITIAL_CHAR_CASE_INSENSITIVE_ID);
        assert_eq!(d.lowercase_term(), "von Willebrand");
    }

    #[test]
    fn test_lowercase_entire_term() {
        let d = description("HEART Attack", CaseSignificance::ENTIRE_TERM_CASE_INSENSITIVE_ID);
        assert_eq!(d.lowercase_term(), "heart attack");
    }

    #[test]
    fn test_case_sensitive_unchanged() {
        let d = description("Diabetes", CaseSignificance::ENTIRE_TERM_CASE_SENSITIVE_ID);
        assert_eq!(d.lowercase_term(), "Diabetes");

        let d = description("pH measurement", CaseSignificance::ENTIRE_TERM_CASE_SENSITIVE_ID);
        assert_eq!(d.lowercase_term(), "pH measurement");
    }

    #[test]
    fn test_empty_term() {
        let d = description("", CaseSignificance::INITIAL_CHAR_CASE_INSENSITIVE_ID);
        assert_eq!(d.lowercase_term(), "");
    }
}
