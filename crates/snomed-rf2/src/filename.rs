//! RF2 file-name decoding.
//!
//! RF2 release files follow the convention
//! `[FileType]_[ContentType]_[ContentSubType]_[CountryNamespace]_[VersionDate].[Extension]`,
//! for example `sct2_Concept_Snapshot_INT_20230131.txt` or
//! `der2_cRefset_LanguageSnapshot-en_INT_20230131.txt`. For reference
//! sets the portion of the ContentType preceding `Refset` is a field
//! pattern: one character per extra column, `c` = SCTID, `i` = integer,
//! `s` = string.

use crate::error::{Rf2Error, Rf2Result};

/// The component kind a release file carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    /// `sct2_Concept_*`
    Concept,
    /// `sct2_Description_*` (per-language files included)
    Description,
    /// `sct2_TextDefinition_*` — parsed with the description layout
    TextDefinition,
    /// `sct2_Relationship_*`
    Relationship,
    /// `sct2_StatedRelationship_*`
    StatedRelationship,
    /// `sct2_RelationshipConcreteValues_*`
    ConcreteRelationship,
    /// `der2_*Refset_*` with its field pattern
    Refset {
        /// Extra-column pattern, possibly empty (simple refsets).
        pattern: String,
    },
    /// Anything else with a well-formed name (e.g. `sct2_Identifier_*`).
    Other(String),
}

/// Release type of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseType {
    /// Every version of every component.
    Full,
    /// The latest version of every component.
    Snapshot,
    /// Components changed since the previous release.
    Delta,
}

/// A decoded RF2 file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rf2Filename {
    /// Leading file type field (`sct2`, `der2`, ...).
    pub file_type: String,
    /// The component kind, with the field pattern for refsets.
    pub entity: Entity,
    /// Refset name extracted from the ContentSubType (empty for core
    /// files), e.g. `Language` for `LanguageSnapshot-en`.
    pub refset_type: String,
    /// Full/Snapshot/Delta.
    pub release_type: ReleaseType,
    /// Country/namespace field, e.g. `INT`.
    pub country_namespace: String,
    /// Version date, YYYYMMDD.
    pub version_date: u32,
}

impl Rf2Filename {
    /// Decodes an RF2 file name.
    ///
    /// ```
    /// use snomed_rf2::filename::{Entity, Rf2Filename, ReleaseType};
    ///
    /// let decoded = Rf2Filename::parse("der2_cRefset_LanguageSnapshot-en_INT_20230131.txt").unwrap();
    /// assert_eq!(decoded.entity, Entity::Refset { pattern: "c".to_string() });
    /// assert_eq!(decoded.refset_type, "Language");
    /// assert_eq!(decoded.release_type, ReleaseType::Snapshot);
    /// assert_eq!(decoded.version_date, 20230131);
    /// ```
    pub fn parse(name: &str) -> Rf2Result<Self> {
        let stem = name
            .rsplit('/')
            .next()
            .unwrap_or(name)
            .trim_end_matches(".txt");
        let parts: Vec<&str> = stem.split('_').collect();
        if parts.len() < 5 {
            return Err(Rf2Error::UnrecognizedFilename { name: name.to_string() });
        }

        let version_date = parts[parts.len() - 1];
        if version_date.len() != 8 || !version_date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Rf2Error::UnrecognizedFilename { name: name.to_string() });
        }
        let version_date: u32 = version_date
            .parse()
            .map_err(|_| Rf2Error::InvalidDate { value: parts[parts.len() - 1].to_string() })?;

        let country_namespace = parts[parts.len() - 2].to_string();
        let file_type = parts[0].to_string();
        let content_type = parts[1];
        let content_sub_type = parts[2..parts.len() - 2].join("_");

        let release_type = release_type_of(&content_sub_type)
            .ok_or_else(|| Rf2Error::UnrecognizedFilename { name: name.to_string() })?;

        let (entity, refset_type) = match content_type {
            "Concept" => (Entity::Concept, String::new()),
            "Description" => (Entity::Description, String::new()),
            "TextDefinition" => (Entity::TextDefinition, String::new()),
            "Relationship" => (Entity::Relationship, String::new()),
            "StatedRelationship" => (Entity::StatedRelationship, String::new()),
            "RelationshipConcreteValues" => (Entity::ConcreteRelationship, String::new()),
            other => {
                if let Some(pattern) = other.strip_suffix("Refset") {
                    if !pattern.bytes().all(|b| matches!(b, b'c' | b'i' | b's')) {
                        return Err(Rf2Error::InvalidPattern { pattern: pattern.to_string() });
                    }
                    let refset_type = refset_type_of(&content_sub_type, release_type);
                    (Entity::Refset { pattern: pattern.to_string() }, refset_type)
                } else {
                    (Entity::Other(other.to_string()), String::new())
                }
            }
        };

        Ok(Self {
            file_type,
            entity,
            refset_type,
            release_type,
            country_namespace,
            version_date,
        })
    }

    /// Returns true for snapshot files, the only release type the
    /// ingestion pipeline consumes.
    pub fn is_snapshot(&self) -> bool {
        self.release_type == ReleaseType::Snapshot
    }
}

fn release_type_of(content_sub_type: &str) -> Option<ReleaseType> {
    if content_sub_type.contains("Snapshot") {
        Some(ReleaseType::Snapshot)
    } else if content_sub_type.contains("Full") {
        Some(ReleaseType::Full)
    } else if content_sub_type.contains("Delta") {
        Some(ReleaseType::Delta)
    } else {
        None
    }
}

/// Extracts the refset name from a ContentSubType such as
/// `LanguageSnapshot-en` or `ExtendedMapFull`.
fn refset_type_of(content_sub_type: &str, release_type: ReleaseType) -> String {
    let marker = match release_type {
        ReleaseType::Full => "Full",
        ReleaseType::Snapshot => "Snapshot",
        ReleaseType::Delta => "Delta",
    };
    match content_sub_type.find(marker) {
        Some(at) => content_sub_type[..at].to_string(),
        None => content_sub_type.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_component_names() {
        let decoded = Rf2Filename::parse("sct2_Concept_Snapshot_INT_20230131.txt").unwrap();
        assert_eq!(decoded.file_type, "sct2");
        assert_eq!(decoded.entity, Entity::Concept);
        assert_eq!(decoded.refset_type, "");
        assert_eq!(decoded.country_namespace, "INT");

        let decoded =
            Rf2Filename::parse("sct2_Description_Snapshot-en_INT_20230131.txt").unwrap();
        assert_eq!(decoded.entity, Entity::Description);

        let decoded =
            Rf2Filename::parse("sct2_StatedRelationship_Delta_INT_20230131.txt").unwrap();
        assert_eq!(decoded.entity, Entity::StatedRelationship);
        assert_eq!(decoded.release_type, ReleaseType::Delta);

        let decoded =
            Rf2Filename::parse("sct2_RelationshipConcreteValues_Snapshot_INT_20230131.txt")
                .unwrap();
        assert_eq!(decoded.entity, Entity::ConcreteRelationship);
    }

    #[test]
    fn test_refset_patterns() {
        let decoded =
            Rf2Filename::parse("der2_Refset_SimpleSnapshot_INT_20230131.txt").unwrap();
        assert_eq!(decoded.entity, Entity::Refset { pattern: String::new() });
        assert_eq!(decoded.refset_type, "Simple");

        let decoded =
            Rf2Filename::parse("der2_iisssccRefset_ExtendedMapSnapshot_INT_20230131.txt").unwrap();
        assert_eq!(decoded.entity, Entity::Refset { pattern: "iissscc".to_string() });
        assert_eq!(decoded.refset_type, "ExtendedMap");

        let decoded =
            Rf2Filename::parse("der2_cciRefset_RefsetDescriptorSnapshot_INT_20230131.txt")
                .unwrap();
        assert_eq!(decoded.entity, Entity::Refset { pattern: "cci".to_string() });
    }

    #[test]
    fn test_full_path_is_accepted() {
        let decoded = Rf2Filename::parse(
            "Snapshot/Terminology/sct2_Concept_Snapshot_INT_20230131.txt",
        )
        .unwrap();
        assert_eq!(decoded.entity, Entity::Concept);
    }

    #[test]
    fn test_rejects_malformed_names() {
        assert!(Rf2Filename::parse("notes.txt").is_err());
        assert!(Rf2Filename::parse("sct2_Concept_Snapshot_INT_2023013.txt").is_err());
        assert!(Rf2Filename::parse("der2_xRefset_SimpleSnapshot_INT_20230131.txt").is_err());
        // No release type in the subtype field
        assert!(Rf2Filename::parse("sct2_Concept_Weekly_INT_20230131.txt").is_err());
    }
}
