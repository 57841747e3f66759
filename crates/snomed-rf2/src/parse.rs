//! Typed row parsers for RF2 tab-delimited files.
//!
//! Core component files have fixed column layouts; reference-set files
//! have six header columns followed by pattern-driven extra columns.
//! All files are UTF-8 with a header line; the reader tolerates a BOM
//! and both CRLF and LF endings.

use std::fs::File;
use std::io::{BufReader, Read};
use std::marker::PhantomData;
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord};
use snomed_types::{Concept, ConcreteRelationship, Description, Relationship};

use crate::error::{Rf2Error, Rf2Result};

/// Trait for component types parseable from an RF2 row.
pub trait Rf2Record: Sized {
    /// Expected column names for this record type.
    const EXPECTED_COLUMNS: &'static [&'static str];

    /// Parses a record from a tab-delimited row.
    fn from_record(record: &StringRecord) -> Rf2Result<Self>;
}

/// A streaming reader over one RF2 file, yielding typed records.
#[derive(Debug)]
pub struct Rf2FileReader<R: Read, T: Rf2Record> {
    reader: Reader<R>,
    _marker: PhantomData<T>,
}

impl<T: Rf2Record> Rf2FileReader<BufReader<File>, T> {
    /// Opens a reader over a file path, validating the header line.
    pub fn open<P: AsRef<Path>>(path: P) -> Rf2Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read, T: Rf2Record> Rf2FileReader<R, T> {
    /// Creates a reader from any byte source, validating the header line.
    pub fn from_reader(reader: R) -> Rf2Result<Self> {
        let mut csv_reader = tab_reader(reader);
        validate_headers(&mut csv_reader, T::EXPECTED_COLUMNS)?;
        Ok(Self { reader: csv_reader, _marker: PhantomData })
    }
}

impl<R: Read, T: Rf2Record> Iterator for Rf2FileReader<R, T> {
    type Item = Rf2Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut record = StringRecord::new();
            match self.reader.read_record(&mut record) {
                Ok(true) => {
                    if record.is_empty() || record.iter().all(|f| f.trim().is_empty()) {
                        continue;
                    }
                    return Some(T::from_record(&record));
                }
                Ok(false) => return None,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// Builds the tab-delimited CSV reader shared by all RF2 parsers.
///
/// Quoting is disabled: RF2 terms may contain unbalanced `"` characters
/// and the format never quotes fields.
pub(crate) fn tab_reader<R: Read>(reader: R) -> Reader<R> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::None)
        .from_reader(reader)
}

/// Validates leading header columns against the expected names,
/// tolerating a UTF-8 BOM on the first column.
pub(crate) fn validate_headers<R: Read>(
    reader: &mut Reader<R>,
    expected: &[&str],
) -> Rf2Result<()> {
    let headers = reader.headers()?.clone();
    if headers.len() < expected.len() {
        return Err(Rf2Error::ShortRow { expected: expected.len(), found: headers.len() });
    }
    for (i, expected_col) in expected.iter().enumerate() {
        let found = headers.get(i).unwrap_or("").trim_start_matches('\u{feff}');
        if found != *expected_col {
            return Err(Rf2Error::UnexpectedColumn {
                position: i,
                expected: expected_col.to_string(),
                found: found.to_string(),
            });
        }
    }
    Ok(())
}

/// Field-level parsing helpers.
pub mod parse {
    use snomed_types::SctId;
    use uuid::Uuid;

    use super::{Rf2Error, Rf2Result};

    /// Parses an SCTID from a decimal string.
    pub fn sctid(value: &str) -> Rf2Result<SctId> {
        value
            .parse::<u64>()
            .map_err(|_| Rf2Error::InvalidSctId { value: value.to_string() })
    }

    /// Parses a refset member identifier.
    pub fn uuid(value: &str) -> Rf2Result<Uuid> {
        Uuid::parse_str(value).map_err(|_| Rf2Error::InvalidUuid { value: value.to_string() })
    }

    /// Parses a boolean from `"0"` or `"1"`.
    pub fn boolean(value: &str) -> Rf2Result<bool> {
        match value {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(Rf2Error::InvalidBoolean { value: value.to_string() }),
        }
    }

    /// Parses an effective time (YYYYMMDD) as u32.
    pub fn effective_time(value: &str) -> Rf2Result<u32> {
        if value.len() != 8 {
            return Err(Rf2Error::InvalidDate { value: value.to_string() });
        }
        value
            .parse::<u32>()
            .map_err(|_| Rf2Error::InvalidDate { value: value.to_string() })
    }

    /// Parses an integer value.
    pub fn integer<T: std::str::FromStr>(value: &str) -> Rf2Result<T> {
        value
            .parse::<T>()
            .map_err(|_| Rf2Error::InvalidInteger { value: value.to_string() })
    }
}

fn field<'r>(record: &'r StringRecord, i: usize) -> &'r str {
    record.get(i).unwrap_or("")
}

impl Rf2Record for Concept {
    const EXPECTED_COLUMNS: &'static [&'static str] =
        &["id", "effectiveTime", "active", "moduleId", "definitionStatusId"];

    fn from_record(record: &StringRecord) -> Rf2Result<Self> {
        if record.len() < Self::EXPECTED_COLUMNS.len() {
            return Err(Rf2Error::ShortRow {
                expected: Self::EXPECTED_COLUMNS.len(),
                found: record.len(),
            });
        }
        Ok(Self {
            id: parse::sctid(field(record, 0))?,
            effective_time: parse::effective_time(field(record, 1))?,
            active: parse::boolean(field(record, 2))?,
            module_id: parse::sctid(field(record, 3))?,
            definition_status_id: parse::sctid(field(record, 4))?,
        })
    }
}

impl Rf2Record for Description {
    const EXPECTED_COLUMNS: &'static [&'static str] = &[
        "id",
        "effectiveTime",
        "active",
        "moduleId",
        "conceptId",
        "languageCode",
        "typeId",
        "term",
        "caseSignificanceId",
    ];

    fn from_record(record: &StringRecord) -> Rf2Result<Self> {
        if record.len() < Self::EXPECTED_COLUMNS.len() {
            return Err(Rf2Error::ShortRow {
                expected: Self::EXPECTED_COLUMNS.len(),
                found: record.len(),
            });
        }
        Ok(Self {
            id: parse::sctid(field(record, 0))?,
            effective_time: parse::effective_time(field(record, 1))?,
            active: parse::boolean(field(record, 2))?,
            module_id: parse::sctid(field(record, 3))?,
            concept_id: parse::sctid(field(record, 4))?,
            language_code: field(record, 5).to_string(),
            type_id: parse::sctid(field(record, 6))?,
            term: field(record, 7).to_string(),
            case_significance_id: parse::sctid(field(record, 8))?,
        })
    }
}

impl Rf2Record for Relationship {
    const EXPECTED_COLUMNS: &'static [&'static str] = &[
        "id",
        "effectiveTime",
        "active",
        "moduleId",
        "sourceId",
        "destinationId",
        "relationshipGroup",
        "typeId",
        "characteristicTypeId",
        "modifierId",
    ];

    fn from_record(record: &StringRecord) -> Rf2Result<Self> {
        if record.len() < Self::EXPECTED_COLUMNS.len() {
            return Err(Rf2Error::ShortRow {
                expected: Self::EXPECTED_COLUMNS.len(),
                found: record.len(),
            });
        }
        Ok(Self {
            id: parse::sctid(field(record, 0))?,
            effective_time: parse::effective_time(field(record, 1))?,
            active: parse::boolean(field(record, 2))?,
            module_id: parse::sctid(field(record, 3))?,
            source_id: parse::sctid(field(record, 4))?,
            destination_id: parse::sctid(field(record, 5))?,
            relationship_group: parse::integer(field(record, 6))?,
            type_id: parse::sctid(field(record, 7))?,
            characteristic_type_id: parse::sctid(field(record, 8))?,
            modifier_id: parse::sctid(field(record, 9))?,
        })
    }
}

impl Rf2Record for ConcreteRelationship {
    const EXPECTED_COLUMNS: &'static [&'static str] = &[
        "id",
        "effectiveTime",
        "active",
        "moduleId",
        "sourceId",
        "value",
        "relationshipGroup",
        "typeId",
        "characteristicTypeId",
        "modifierId",
    ];

    fn from_record(record: &StringRecord) -> Rf2Result<Self> {
        if record.len() < Self::EXPECTED_COLUMNS.len() {
            return Err(Rf2Error::ShortRow {
                expected: Self::EXPECTED_COLUMNS.len(),
                found: record.len(),
            });
        }
        Ok(Self {
            id: parse::sctid(field(record, 0))?,
            effective_time: parse::effective_time(field(record, 1))?,
            active: parse::boolean(field(record, 2))?,
            module_id: parse::sctid(field(record, 3))?,
            source_id: parse::sctid(field(record, 4))?,
            value: field(record, 5).to_string(),
            relationship_group: parse::integer(field(record, 6))?,
            type_id: parse::sctid(field(record, 7))?,
            characteristic_type_id: parse::sctid(field(record, 8))?,
            modifier_id: parse::sctid(field(record, 9))?,
        })
    }
}

/// Renders a component record back to its RF2 row form (without the
/// trailing newline). Inverse of [`Rf2Record::from_record`].
pub trait ToRf2Row {
    /// The tab-joined RF2 row for this record.
    fn to_rf2_row(&self) -> String;
}

fn bool_field(active: bool) -> &'static str {
    if active {
        "1"
    } else {
        "0"
    }
}

impl ToRf2Row for Concept {
    fn to_rf2_row(&self) -> String {
        format!(
            "{}\t{:08}\t{}\t{}\t{}",
            self.id,
            self.effective_time,
            bool_field(self.active),
            self.module_id,
            self.definition_status_id
        )
    }
}

impl ToRf2Row for Description {
    fn to_rf2_row(&self) -> String {
        format!(
            "{}\t{:08}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.id,
            self.effective_time,
            bool_field(self.active),
            self.module_id,
            self.concept_id,
            self.language_code,
            self.type_id,
            self.term,
            self.case_significance_id
        )
    }
}

impl ToRf2Row for Relationship {
    fn to_rf2_row(&self) -> String {
        format!(
            "{}\t{:08}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.id,
            self.effective_time,
            bool_field(self.active),
            self.module_id,
            self.source_id,
            self.destination_id,
            self.relationship_group,
            self.type_id,
            self.characteristic_type_id,
            self.modifier_id
        )
    }
}

impl ToRf2Row for ConcreteRelationship {
    fn to_rf2_row(&self) -> String {
        format!(
            "{}\t{:08}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.id,
            self.effective_time,
            bool_field(self.active),
            self.module_id,
            self.source_id,
            self.value,
            self.relationship_group,
            self.type_id,
            self.characteristic_type_id,
            self.modifier_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONCEPT_FILE: &str = "id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\r\n\
        24700007\t20020131\t1\t900000000000207008\t900000000000074008\r\n\
        6118003\t20020131\t1\t900000000000207008\t900000000000074008\r\n";

    #[test]
    fn test_read_concept_file() {
        let reader =
            Rf2FileReader::<_, Concept>::from_reader(CONCEPT_FILE.as_bytes()).unwrap();
        let concepts: Vec<Concept> = reader.collect::<Rf2Result<_>>().unwrap();
        assert_eq!(concepts.len(), 2);
        assert_eq!(concepts[0].id, 24700007);
        assert!(concepts[0].active);
    }

    #[test]
    fn test_bom_tolerated() {
        let with_bom = format!("\u{feff}{CONCEPT_FILE}");
        let reader =
            Rf2FileReader::<_, Concept>::from_reader(with_bom.as_bytes()).unwrap();
        assert_eq!(reader.count(), 2);
    }

    #[test]
    fn test_header_mismatch_rejected() {
        let bad = "id\tdate\tactive\tmoduleId\tdefinitionStatusId\n";
        let err = Rf2FileReader::<_, Concept>::from_reader(bad.as_bytes()).unwrap_err();
        assert!(matches!(err, Rf2Error::UnexpectedColumn { position: 1, .. }));
    }

    #[test]
    fn test_bad_row_reported_but_iteration_continues() {
        let file = "id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\n\
            nope\t20020131\t1\t900000000000207008\t900000000000074008\n\
            6118003\t20020131\t1\t900000000000207008\t900000000000074008\n";
        let reader = Rf2FileReader::<_, Concept>::from_reader(file.as_bytes()).unwrap();
        let results: Vec<_> = reader.collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert_eq!(results[1].as_ref().unwrap().id, 6118003);
    }

    #[test]
    fn test_description_round_trip() {
        let original = Description {
            id: 754786011,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            concept_id: 73211009,
            language_code: "en".to_string(),
            type_id: 900000000000003001,
            term: "Diabetes mellitus (disorder)".to_string(),
            case_significance_id: 900000000000448009,
        };
        let file = format!(
            "{}\n{}\n",
            Description::EXPECTED_COLUMNS.join("\t"),
            original.to_rf2_row()
        );
        let reader = Rf2FileReader::<_, Description>::from_reader(file.as_bytes()).unwrap();
        let parsed: Vec<Description> = reader.collect::<Rf2Result<_>>().unwrap();
        assert_eq!(parsed, vec![original]);
    }

    #[test]
    fn test_relationship_round_trip() {
        let original = Relationship {
            id: 3187444026,
            effective_time: 20230131,
            active: true,
            module_id: 900000000000207008,
            source_id: 24700007,
            destination_id: 6118003,
            relationship_group: 0,
            type_id: 116680003,
            characteristic_type_id: 900000000000011006,
            modifier_id: 900000000000451002,
        };
        let file = format!(
            "{}\n{}\n",
            Relationship::EXPECTED_COLUMNS.join("\t"),
            original.to_rf2_row()
        );
        let reader = Rf2FileReader::<_, Relationship>::from_reader(file.as_bytes()).unwrap();
        let parsed: Vec<Relationship> = reader.collect::<Rf2Result<_>>().unwrap();
        assert_eq!(parsed, vec![original]);
    }

    #[test]
    fn test_concrete_relationship_round_trip() {
        let original = ConcreteRelationship {
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
        };
        let file = format!(
            "{}\n{}\n",
            ConcreteRelationship::EXPECTED_COLUMNS.join("\t"),
            original.to_rf2_row()
        );
        let reader =
            Rf2FileReader::<_, ConcreteRelationship>::from_reader(file.as_bytes()).unwrap();
        let parsed: Vec<ConcreteRelationship> = reader.collect::<Rf2Result<_>>().unwrap();
        assert_eq!(parsed, vec![original]);
    }
}
