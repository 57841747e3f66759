//! Locale resolution: BCP-47 language priority lists to language
//! reference sets.
//!
//! A caller expresses its dialect preference as an HTTP-style
//! `Accept-Language` value (e.g. `"en-GB,en;q=0.9"`). Resolution maps
//! that onto an ordered list of installed language-refset identifiers,
//! via RFC 4647 basic filtering over a built-in dialect table. A
//! private-use extension of the form `en-x-999001261000000100` selects
//! a refset by concept id directly.

use std::collections::HashSet;

use snomed_types::{identifier, well_known, SctId};
use tracing::debug;

/// Built-in mapping from lowercase BCP-47 tags to the language refsets
/// serving them, in preference order. National extensions not listed
/// here remain reachable through the `-x-` concept-id form.
const DIALECT_REFSETS: &[(&str, &[SctId])] = &[
    ("en-us", &[well_known::US_ENGLISH]),
    ("en-gb", &[well_known::GB_ENGLISH]),
    ("da-dk", &[554461000005103]),
    ("sv-se", &[46011000052107]),
    ("nl-nl", &[31000146106]),
    ("en-ca", &[19491000087109]),
    ("fr-ca", &[20581000087109]),
];

/// An installed view of the dialect table, built once per snapshot.
///
/// The map closes over the refsets installed at build time; rebuild it
/// after re-ingestion.
#[derive(Debug, Clone)]
pub struct LanguageMap {
    entries: Vec<(&'static str, Vec<SctId>)>,
    installed: HashSet<SctId>,
}

impl LanguageMap {
    /// Builds the map, keeping only installed refsets.
    pub fn new(installed: HashSet<SctId>) -> Self {
        let entries = DIALECT_REFSETS
            .iter()
            .map(|(tag, refsets)| {
                let present: Vec<SctId> =
                    refsets.iter().copied().filter(|r| installed.contains(r)).collect();
                (*tag, present)
            })
            .filter(|(_, refsets)| !refsets.is_empty())
            .collect();
        Self { entries, installed }
    }

    /// Resolves a language priority list to an ordered refset list.
    ///
    /// Unparseable input resolves to the empty list, never an error.
    pub fn resolve(&self, priority_list: &str) -> Vec<SctId> {
        if let Some(refset_id) = parse_refset_extension(priority_list) {
            return if self.installed.contains(&refset_id) { vec![refset_id] } else { vec![] };
        }

        let mut result = Vec::new();
        for range in parse_priority_list(priority_list) {
            for (tag, refsets) in &self.entries {
                if range_matches(&range, tag) {
                    for &refset in refsets {
                        if !result.contains(&refset) {
                            result.push(refset);
                        }
                    }
                }
            }
        }
        if result.is_empty() {
            debug!(header = priority_list, "no language refset matches priority list");
        }
        result
    }
}

/// Recognizes the `*-x-<sctid>` private-use form, returning the refset
/// concept id when the digits are a checksum-valid concept identifier.
fn parse_refset_extension(priority_list: &str) -> Option<SctId> {
    let tag = priority_list.trim();
    let (_, digits) = tag.split_once("-x-")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let id: SctId = digits.parse().ok()?;
    identifier::valid_for(id, snomed_types::ComponentKind::Concept).then_some(id)
}

/// Parses an Accept-Language value into lowercase ranges ordered by
/// descending quality weight (stable for equal weights).
fn parse_priority_list(priority_list: &str) -> Vec<String> {
    let mut weighted: Vec<(f64, String)> = Vec::new();
    for part in priority_list.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (range, weight) = match part.split_once(';') {
            Some((range, params)) => {
                let weight = params
                    .trim()
                    .strip_prefix("q=")
                    .and_then(|q| q.parse::<f64>().ok())
                    .unwrap_or(1.0);
                (range, weight)
            }
            None => (part, 1.0),
        };
        let range = range.trim().to_ascii_lowercase();
        if !range.is_empty() && weight > 0.0 {
            weighted.push((weight, range));
        }
    }
    weighted.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    weighted.into_iter().map(|(_, range)| range).collect()
}

/// RFC 4647 basic filtering: a range matches a tag when it equals the
/// tag, is a prefix of it at a subtag boundary, or is `*`.
fn range_matches(range: &str, tag: &str) -> bool {
    range == "*"
        || tag == range
        || (tag.len() > range.len()
            && tag.starts_with(range)
            && tag.as_bytes()[range.len()] == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> LanguageMap {
        LanguageMap::new(HashSet::from([
            well_known::GB_ENGLISH,
            well_known::US_ENGLISH,
            554461000005103,
            999001261000000100,
        ]))
    }

    #[test]
    fn test_exact_dialects() {
        let map = map();
        assert_eq!(map.resolve("en-GB"), vec![well_known::GB_ENGLISH]);
        assert_eq!(map.resolve("en-US"), vec![well_known::US_ENGLISH]);
        assert_eq!(map.resolve("da-DK"), vec![554461000005103]);
    }

    #[test]
    fn test_prefix_matching_and_order() {
        let map = map();
        // "en" matches both English dialects, table order applies.
        assert_eq!(map.resolve("en"), vec![well_known::US_ENGLISH, well_known::GB_ENGLISH]);
        // Explicit dialect first, broader range after.
        assert_eq!(
            map.resolve("en-GB,en;q=0.9"),
            vec![well_known::GB_ENGLISH, well_known::US_ENGLISH]
        );
    }

    #[test]
    fn test_quality_weights_order_ranges() {
        let map = map();
        assert_eq!(
            map.resolve("en-US;q=0.4,en-GB;q=0.8"),
            vec![well_known::GB_ENGLISH, well_known::US_ENGLISH]
        );
    }

    #[test]
    fn test_wildcard_matches_everything_installed() {
        let map = map();
        let resolved = map.resolve("*");
        assert!(resolved.contains(&well_known::GB_ENGLISH));
        assert!(resolved.contains(&554461000005103));
    }

    #[test]
    fn test_refset_extension_form() {
        let map = map();
        assert_eq!(map.resolve("en-x-999001261000000100"), vec![999001261000000100]);
        // Valid id but not installed
        assert_eq!(map.resolve("en-x-900000000000509007"), Vec::<SctId>::new());
        // Corrupt check digit falls through to normal matching
        assert_eq!(map.resolve("en-gb-x-999001261000000101"), Vec::<SctId>::new());
    }

    #[test]
    fn test_unparseable_input_is_empty() {
        let map = map();
        assert_eq!(map.resolve(""), Vec::<SctId>::new());
        assert_eq!(map.resolve(";;;"), Vec::<SctId>::new());
        assert_eq!(map.resolve("zz-ZZ"), Vec::<SctId>::new());
    }

    #[test]
    fn test_uninstalled_refsets_are_dropped() {
        let map = LanguageMap::new(HashSet::from([well_known::GB_ENGLISH]));
        assert_eq!(map.resolve("en"), vec![well_known::GB_ENGLISH]);
        assert_eq!(map.resolve("en-US"), Vec::<SctId>::new());
    }
}
