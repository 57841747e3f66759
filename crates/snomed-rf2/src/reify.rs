//! Reference-set row parsing and reification.
//!
//! Refset rows share six header columns; the remaining columns are
//! parsed by the file's `c|i|s` pattern into a typed field vector, then
//! reified into a concrete [`RefsetItem`] variant. The shape is chosen
//! by a registry keyed on the refset's attribute-description concept-id
//! sequence — the sequence a RefsetDescriptor declares for the refset,
//! which is equally derivable from the file's header column names, so
//! reification works in a single pass over a release.

use std::io::Read;

use csv::StringRecord;
use snomed_types::well_known as wk;
use snomed_types::{RefsetField, RefsetHeader, RefsetItem, RefsetKind, SctId};

use crate::error::{Rf2Error, Rf2Result};
use crate::parse::{parse, tab_reader, validate_headers};

/// Header columns common to every refset file.
pub const REFSET_HEADER_COLUMNS: &[&str] =
    &["id", "effectiveTime", "active", "moduleId", "refsetId", "referencedComponentId"];

/// Maps a refset file's extra-column name to its attribute-description
/// concept id.
pub fn attribute_description_for_column(column: &str) -> Option<SctId> {
    match column {
        "targetComponentId" | "targetComponent" => Some(wk::TARGET_COMPONENT),
        "acceptabilityId" => Some(wk::ACCEPTABILITY_ATTRIBUTE),
        "mapTarget" => Some(wk::MAP_TARGET_ATTRIBUTE),
        "mapGroup" => Some(wk::MAP_GROUP_ATTRIBUTE),
        "mapCategoryId" => Some(wk::MAP_CATEGORY_ATTRIBUTE),
        "valueId" => Some(wk::VALUE_ATTRIBUTE),
        "owlExpression" => Some(wk::OWL_EXPRESSION_ATTRIBUTE),
        "sourceEffectiveTime" => Some(wk::SOURCE_EFFECTIVE_TIME_ATTRIBUTE),
        "targetEffectiveTime" => Some(wk::TARGET_EFFECTIVE_TIME_ATTRIBUTE),
        _ => None,
    }
}

/// Derives the attribute-description sequence a RefsetDescriptor would
/// declare for a file, from its extra header columns.
///
/// The leading entry describes the `referencedComponentId` column
/// itself: map refsets declare it as "map source concept", module
/// dependency refsets as "module dependency", everything else as
/// "referenced component".
pub fn descriptor_sequence(extra_columns: &[&str]) -> Vec<SctId> {
    let lead = if extra_columns.contains(&"mapTarget") {
        wk::MAP_SOURCE
    } else if extra_columns.contains(&"sourceEffectiveTime") {
        wk::MODULE_DEPENDENCY_ATTRIBUTE
    } else {
        wk::REFERENCED_COMPONENT
    };
    let mut ids = vec![lead];
    ids.extend(extra_columns.iter().filter_map(|c| attribute_description_for_column(c)));
    ids
}

/// The registry of spec §4.1: maps an attribute-description-id sequence
/// to the refset shape it declares.
pub fn kind_for_descriptor(ids: &[SctId]) -> Option<RefsetKind> {
    let first = *ids.first()?;
    let second = ids.get(1).copied();
    match (first, second) {
        (wk::REFERENCED_COMPONENT, None) => Some(RefsetKind::Simple),
        (wk::REFERENCED_COMPONENT, Some(wk::TARGET_COMPONENT)) => Some(RefsetKind::Association),
        (wk::REFERENCED_COMPONENT, Some(wk::ACCEPTABILITY_ATTRIBUTE)) => Some(RefsetKind::Language),
        (wk::REFERENCED_COMPONENT, Some(wk::VALUE_ATTRIBUTE)) => Some(RefsetKind::AttributeValue),
        (wk::REFERENCED_COMPONENT, Some(wk::OWL_EXPRESSION_ATTRIBUTE)) => {
            Some(RefsetKind::OwlExpression)
        }
        (wk::MODULE_DEPENDENCY_ATTRIBUTE, _) => Some(RefsetKind::ModuleDependency),
        (wk::MAP_SOURCE, Some(_)) => {
            if ids.contains(&wk::MAP_CATEGORY_ATTRIBUTE) {
                Some(RefsetKind::ExtendedMap)
            } else if ids.contains(&wk::MAP_GROUP_ATTRIBUTE) {
                Some(RefsetKind::ComplexMap)
            } else {
                Some(RefsetKind::SimpleMap)
            }
        }
        _ => None,
    }
}

/// A reader over one refset file, yielding reified [`RefsetItem`]s.
pub struct RefsetFileReader<R: Read> {
    reader: csv::Reader<R>,
    pattern: Vec<u8>,
    kind: Option<RefsetKind>,
}

impl<R: Read> RefsetFileReader<R> {
    /// Opens a refset reader, validating the six header columns and
    /// classifying the file's shape from its extra columns and the
    /// filename-derived pattern.
    pub fn from_reader(reader: R, pattern: &str) -> Rf2Result<Self> {
        if !pattern.bytes().all(|b| matches!(b, b'c' | b'i' | b's')) {
            return Err(Rf2Error::InvalidPattern { pattern: pattern.to_string() });
        }
        let mut csv_reader = tab_reader(reader);
        validate_headers(&mut csv_reader, REFSET_HEADER_COLUMNS)?;

        let headers = csv_reader.headers()?.clone();
        let extra_columns: Vec<&str> =
            headers.iter().skip(REFSET_HEADER_COLUMNS.len()).collect();

        let kind = if extra_columns
            == ["attributeDescription", "attributeType", "attributeOrder"]
        {
            Some(RefsetKind::RefsetDescriptor)
        } else if pattern.is_empty() && extra_columns.is_empty() {
            Some(RefsetKind::Simple)
        } else {
            kind_for_descriptor(&descriptor_sequence(&extra_columns))
        };

        Ok(Self { reader: csv_reader, pattern: pattern.as_bytes().to_vec(), kind })
    }

    /// The shape this file reifies to, or `None` when rows stay generic.
    pub fn kind(&self) -> Option<RefsetKind> {
        self.kind
    }

    fn parse_row(&self, record: &StringRecord) -> Rf2Result<RefsetItem> {
        let expected = REFSET_HEADER_COLUMNS.len() + self.pattern.len();
        if record.len() < expected {
            return Err(Rf2Error::ShortRow { expected, found: record.len() });
        }

        let header = RefsetHeader {
            id: parse::uuid(record.get(0).unwrap_or(""))?,
            effective_time: parse::effective_time(record.get(1).unwrap_or(""))?,
            active: parse::boolean(record.get(2).unwrap_or(""))?,
            module_id: parse::sctid(record.get(3).unwrap_or(""))?,
            refset_id: parse::sctid(record.get(4).unwrap_or(""))?,
            referenced_component_id: parse::sctid(record.get(5).unwrap_or(""))?,
        };

        let mut fields = Vec::with_capacity(self.pattern.len());
        for (i, kind) in self.pattern.iter().enumerate() {
            let raw = record.get(REFSET_HEADER_COLUMNS.len() + i).unwrap_or("");
            let value = match kind {
                b'c' => RefsetField::ConceptId(parse::sctid(raw)?),
                b'i' => RefsetField::Integer(parse::integer(raw)?),
                _ => RefsetField::String(raw.to_string()),
            };
            fields.push(value);
        }

        Ok(match self.kind.and_then(|kind| reify(&header, &fields, kind)) {
            Some(item) => item,
            None => RefsetItem::Generic { header, fields },
        })
    }
}

impl<R: Read> Iterator for RefsetFileReader<R> {
    type Item = Rf2Result<RefsetItem>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut record = StringRecord::new();
            match self.reader.read_record(&mut record) {
                Ok(true) => {
                    if record.is_empty() || record.iter().all(|f| f.trim().is_empty()) {
                        continue;
                    }
                    return Some(self.parse_row(&record));
                }
                Ok(false) => return None,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// Reifies a generic refset row into the given shape, or `None` when
/// the field vector does not fit (the row is then kept generic).
pub fn reify(header: &RefsetHeader, fields: &[RefsetField], kind: RefsetKind) -> Option<RefsetItem> {
    let header = header.clone();
    match kind {
        RefsetKind::Simple => fields.is_empty().then_some(RefsetItem::Simple { header }),
        RefsetKind::Association => match fields {
            [f] => Some(RefsetItem::Association {
                header,
                target_component_id: f.as_concept_id()?,
            }),
            _ => None,
        },
        RefsetKind::Language => match fields {
            [f] => Some(RefsetItem::Language { header, acceptability_id: f.as_concept_id()? }),
            _ => None,
        },
        RefsetKind::SimpleMap => match fields {
            [f] => Some(RefsetItem::SimpleMap { header, map_target: f.as_string()?.to_string() }),
            _ => None,
        },
        RefsetKind::ComplexMap => match fields {
            [group, priority, rule, advice, target, correlation] => {
                Some(RefsetItem::ComplexMap {
                    header,
                    map_group: group.as_integer()?,
                    map_priority: priority.as_integer()?,
                    map_rule: rule.as_string()?.to_string(),
                    map_advice: advice.as_string()?.to_string(),
                    map_target: target.as_string()?.to_string(),
                    correlation_id: correlation.as_concept_id()?,
                })
            }
            _ => None,
        },
        RefsetKind::ExtendedMap => match fields {
            [group, priority, rule, advice, target, correlation, category] => {
                Some(RefsetItem::ExtendedMap {
                    header,
                    map_group: group.as_integer()?,
                    map_priority: priority.as_integer()?,
                    map_rule: rule.as_string()?.to_string(),
                    map_advice: advice.as_string()?.to_string(),
                    map_target: target.as_string()?.to_string(),
                    correlation_id: correlation.as_concept_id()?,
                    map_category_id: category.as_concept_id()?,
                })
            }
            _ => None,
        },
        RefsetKind::AttributeValue => match fields {
            [f] => Some(RefsetItem::AttributeValue { header, value_id: f.as_concept_id()? }),
            _ => None,
        },
        RefsetKind::OwlExpression => match fields {
            [f] => Some(RefsetItem::OwlExpression {
                header,
                owl_expression: f.as_string()?.to_string(),
            }),
            _ => None,
        },
        RefsetKind::ModuleDependency => match fields {
            [source, target] => Some(RefsetItem::ModuleDependency {
                header,
                source_effective_time: parse_date_field(source)?,
                target_effective_time: parse_date_field(target)?,
            }),
            _ => None,
        },
        RefsetKind::RefsetDescriptor => match fields {
            [description, attribute_type, order] => Some(RefsetItem::RefsetDescriptor {
                header,
                attribute_description_id: description.as_concept_id()?,
                attribute_type_id: attribute_type.as_concept_id()?,
                attribute_order: order.as_integer()?,
            }),
            _ => None,
        },
    }
}

/// Module-dependency dates arrive under an `s` pattern character.
fn parse_date_field(field: &RefsetField) -> Option<u32> {
    let raw = field.as_string()?;
    (raw.len() == 8).then(|| raw.parse::<u32>().ok()).flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANGUAGE_FILE: &str = "id\teffectiveTime\tactive\tmoduleId\trefsetId\treferencedComponentId\tacceptabilityId\n\
        80000517-8513-5ca0-a44c-dc66f3c3a1c6\t20020131\t1\t900000000000207008\t900000000000508004\t754786011\t900000000000548007\n";

    const EXTENDED_MAP_FILE: &str = "id\teffectiveTime\tactive\tmoduleId\trefsetId\treferencedComponentId\tmapGroup\tmapPriority\tmapRule\tmapAdvice\tmapTarget\tcorrelationId\tmapCategoryId\n\
        d9d19b70-0ee3-5b6b-bb9a-9466a8353dd8\t20230131\t1\t900000000000207008\t447562003\t24700007\t1\t1\tTRUE\tALWAYS G35\tG35\t447561005\t447637006\n";

    #[test]
    fn test_language_refset_reified() {
        let reader = RefsetFileReader::from_reader(LANGUAGE_FILE.as_bytes(), "c").unwrap();
        assert_eq!(reader.kind(), Some(RefsetKind::Language));
        let items: Vec<RefsetItem> = reader.collect::<Rf2Result<_>>().unwrap();
        assert_eq!(items.len(), 1);
        match &items[0] {
            RefsetItem::Language { header, acceptability_id } => {
                assert_eq!(header.refset_id, 900000000000508004);
                assert_eq!(header.referenced_component_id, 754786011);
                assert_eq!(*acceptability_id, 900000000000548007);
            }
            other => panic!("expected a language member, got {other:?}"),
        }
    }

    #[test]
    fn test_extended_map_reified() {
        let reader =
            RefsetFileReader::from_reader(EXTENDED_MAP_FILE.as_bytes(), "iissscc").unwrap();
        assert_eq!(reader.kind(), Some(RefsetKind::ExtendedMap));
        let items: Vec<RefsetItem> = reader.collect::<Rf2Result<_>>().unwrap();
        match &items[0] {
            RefsetItem::ExtendedMap { map_target, map_category_id, .. } => {
                assert_eq!(map_target, "G35");
                assert_eq!(*map_category_id, 447637006);
            }
            other => panic!("expected an extended map member, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_shape_stays_generic() {
        let file = "id\teffectiveTime\tactive\tmoduleId\trefsetId\treferencedComponentId\tmysteryColumn\n\
            80000517-8513-5ca0-a44c-dc66f3c3a1c6\t20020131\t1\t900000000000207008\t723264001\t24700007\t42\n";
        let reader = RefsetFileReader::from_reader(file.as_bytes(), "i").unwrap();
        assert_eq!(reader.kind(), None);
        let items: Vec<RefsetItem> = reader.collect::<Rf2Result<_>>().unwrap();
        match &items[0] {
            RefsetItem::Generic { fields, .. } => {
                assert_eq!(fields, &vec![RefsetField::Integer(42)]);
            }
            other => panic!("expected a generic member, got {other:?}"),
        }
    }

    #[test]
    fn test_descriptor_registry_prefixes() {
        use snomed_types::well_known as wk;
        assert_eq!(
            kind_for_descriptor(&[wk::REFERENCED_COMPONENT, wk::TARGET_COMPONENT]),
            Some(RefsetKind::Association)
        );
        assert_eq!(
            kind_for_descriptor(&[wk::REFERENCED_COMPONENT, wk::ACCEPTABILITY_ATTRIBUTE]),
            Some(RefsetKind::Language)
        );
        assert_eq!(
            kind_for_descriptor(&[wk::MAP_SOURCE, wk::MAP_TARGET_ATTRIBUTE]),
            Some(RefsetKind::SimpleMap)
        );
        assert_eq!(
            kind_for_descriptor(&[
                wk::MAP_SOURCE,
                wk::MAP_GROUP_ATTRIBUTE,
                wk::MAP_TARGET_ATTRIBUTE,
            ]),
            Some(RefsetKind::ComplexMap)
        );
        assert_eq!(
            kind_for_descriptor(&[
                wk::MAP_SOURCE,
                wk::MAP_GROUP_ATTRIBUTE,
                wk::MAP_TARGET_ATTRIBUTE,
                wk::MAP_CATEGORY_ATTRIBUTE,
            ]),
            Some(RefsetKind::ExtendedMap)
        );
        assert_eq!(
            kind_for_descriptor(&[wk::REFERENCED_COMPONENT, wk::OWL_EXPRESSION_ATTRIBUTE]),
            Some(RefsetKind::OwlExpression)
        );
        assert_eq!(
            kind_for_descriptor(&[
                wk::MODULE_DEPENDENCY_ATTRIBUTE,
                wk::SOURCE_EFFECTIVE_TIME_ATTRIBUTE,
                wk::TARGET_EFFECTIVE_TIME_ATTRIBUTE,
            ]),
            Some(RefsetKind::ModuleDependency)
        );
        assert_eq!(kind_for_descriptor(&[wk::REFERENCED_COMPONENT]), Some(RefsetKind::Simple));
        assert_eq!(kind_for_descriptor(&[1, 2]), None);
    }

    #[test]
    fn test_reify_round_trip_via_generic_fields() {
        let header = RefsetHeader {
            id: uuid::Uuid::nil(),
            effective_time: 20230131,
            active: true,
            module_id: 900000000000207008,
            refset_id: 900000000000534007,
            referenced_component_id: 900000000000207008,
        };
        let fields = vec![
            RefsetField::String("20230131".to_string()),
            RefsetField::String("20220731".to_string()),
        ];
        let item = reify(&header, &fields, RefsetKind::ModuleDependency).unwrap();
        match item {
            RefsetItem::ModuleDependency { source_effective_time, target_effective_time, .. } => {
                assert_eq!(source_effective_time, 20230131);
                assert_eq!(target_effective_time, 20220731);
            }
            other => panic!("expected a module dependency, got {other:?}"),
        }
    }
}
