//! Search index schema.
//!
//! One document per description. Besides the fixed fields, the schema
//! carries one field family per relationship type — `<t>` (transitive
//! parents), `d<t>` (direct parents) and `c<t>` (direct-parent count) —
//! a `v<t>` field per concrete-value type, and one stored field per
//! language refset holding the concept's preferred synonym in that
//! refset. The schema is built after ingestion, when those sets are
//! enumerable from the store, so every field is an ordinary static
//! field.

use std::collections::HashSet;

use snomed_store::SnomedStore;
use snomed_types::SctId;
use tantivy::schema::{
    Field, IndexRecordOption, NumericOptions, Schema, TextFieldIndexing, TextOptions, FAST,
    INDEXED, STORED, STRING,
};
use tantivy::tokenizer::{AsciiFoldingFilter, LowerCaser, SimpleTokenizer, TextAnalyzer};
use tantivy::Index;

use crate::error::IndexResult;

/// Name of the registered folding analyzer used by [`NTERM`].
pub const FOLDING_TOKENIZER: &str = "folding";

/// Raw description term, stored only.
pub const TERM: &str = "term";
/// Folded tokens of the term, indexed for matching.
pub const NTERM: &str = "nterm";
/// `1/sqrt(len(term))` fast field, boosts shorter matches.
pub const LENGTH_BOOST: &str = "length-boost";
/// Description id, stored.
pub const ID: &str = "id";
/// Description id, indexed.
pub const DESCRIPTION_ID: &str = "description-id";
/// Concept id, indexed + stored + fast.
pub const CONCEPT_ID: &str = "concept-id";
/// Module id, indexed.
pub const MODULE_ID: &str = "module-id";
/// Description type id, indexed.
pub const TYPE_ID: &str = "type-id";
/// `"1"`/`"0"` term for concept activity.
pub const CONCEPT_ACTIVE: &str = "concept-active";
/// `"1"`/`"0"` term for description activity.
pub const DESCRIPTION_ACTIVE: &str = "description-active";
/// Language refsets in which this description is preferred.
pub const PREFERRED_IN: &str = "preferred-in";
/// Language refsets in which this description is acceptable.
pub const ACCEPTABLE_IN: &str = "acceptable-in";
/// Refsets the concept is a member of.
pub const CONCEPT_REFSETS: &str = "concept-refsets";
/// Refsets the description is a member of.
pub const DESCRIPTION_REFSETS: &str = "description-refsets";

/// What the dynamic part of the schema is built from.
#[derive(Debug, Clone, Default)]
pub struct IndexSpec {
    /// Relationship types with at least one active relationship.
    pub relationship_types: Vec<SctId>,
    /// Concrete-value types, `true` when all observed values are numeric.
    pub concrete_types: Vec<(SctId, bool)>,
    /// Installed language refsets.
    pub language_refsets: Vec<SctId>,
}

impl IndexSpec {
    /// Reads the spec from an ingested store.
    pub fn from_store(store: &SnomedStore) -> IndexResult<Self> {
        let mut language_refsets: Vec<SctId> =
            store.installed_language_refsets()?.into_iter().collect();
        language_refsets.sort_unstable();
        Ok(Self {
            relationship_types: store.relationship_type_ids()?,
            concrete_types: store.concrete_type_ids()?,
            language_refsets,
        })
    }
}

/// The built schema with handles to its fixed fields.
#[derive(Clone)]
pub struct SearchSchema {
    /// The underlying schema.
    pub schema: Schema,
    /// Raw term (stored).
    pub term: Field,
    /// Analyzed term.
    pub nterm: Field,
    /// Length boost fast field.
    pub length_boost: Field,
    /// Stored description id.
    pub id: Field,
    /// Indexed description id.
    pub description_id: Field,
    /// Concept id.
    pub concept_id: Field,
    /// Module id.
    pub module_id: Field,
    /// Description type id.
    pub type_id: Field,
    /// Concept activity flag.
    pub concept_active: Field,
    /// Description activity flag.
    pub description_active: Field,
    /// Preferred-in language refsets.
    pub preferred_in: Field,
    /// Acceptable-in language refsets.
    pub acceptable_in: Field,
    /// Concept refset memberships.
    pub concept_refsets: Field,
    /// Description refset memberships.
    pub description_refsets: Field,
    /// Language refsets carrying a stored preferred-synonym field.
    pub language_refsets: Vec<SctId>,
}

impl SearchSchema {
    /// Builds the schema for a snapshot described by `spec`.
    pub fn build(spec: &IndexSpec) -> IndexResult<Self> {
        let mut builder = Schema::builder();

        let nterm_options = TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(FOLDING_TOKENIZER)
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        );

        builder.add_text_field(TERM, STORED);
        builder.add_text_field(NTERM, nterm_options);
        builder.add_f64_field(LENGTH_BOOST, FAST);
        builder.add_u64_field(ID, STORED);
        builder.add_u64_field(DESCRIPTION_ID, INDEXED);
        builder.add_u64_field(
            CONCEPT_ID,
            NumericOptions::default().set_indexed().set_stored().set_fast(),
        );
        builder.add_u64_field(MODULE_ID, INDEXED);
        builder.add_u64_field(TYPE_ID, INDEXED);
        builder.add_text_field(CONCEPT_ACTIVE, STRING);
        builder.add_text_field(DESCRIPTION_ACTIVE, STRING);
        builder.add_u64_field(PREFERRED_IN, INDEXED);
        builder.add_u64_field(ACCEPTABLE_IN, INDEXED);
        builder.add_u64_field(CONCEPT_REFSETS, INDEXED);
        builder.add_u64_field(DESCRIPTION_REFSETS, INDEXED);

        let mut taken: HashSet<String> = HashSet::new();
        for &rel_type in &spec.relationship_types {
            for name in
                [rel_type.to_string(), format!("d{rel_type}"), format!("c{rel_type}")]
            {
                if taken.insert(name.clone()) {
                    builder.add_u64_field(&name, INDEXED);
                }
            }
        }
        for &(concrete_type, numeric) in &spec.concrete_types {
            let name = format!("v{concrete_type}");
            if taken.insert(name.clone()) {
                if numeric {
                    builder.add_f64_field(&name, INDEXED);
                } else {
                    builder.add_text_field(&name, STRING);
                }
            }
        }
        let mut language_refsets = Vec::new();
        for &refset in &spec.language_refsets {
            let name = refset.to_string();
            if taken.insert(name.clone()) {
                builder.add_text_field(&name, STORED);
                language_refsets.push(refset);
            }
        }

        let schema = builder.build();
        Self::from_schema(schema, language_refsets)
    }

    /// Reconstructs the handle set from an existing index's schema.
    pub fn from_index(index: &Index) -> IndexResult<Self> {
        let schema = index.schema();
        let language_refsets = schema
            .fields()
            .filter_map(|(_, entry)| {
                let name = entry.name();
                // Stored per-refset text fields are the only all-digit
                // text fields in the schema.
                let is_text = matches!(entry.field_type(), tantivy::schema::FieldType::Str(_));
                if is_text && name.bytes().all(|b| b.is_ascii_digit()) {
                    name.parse::<SctId>().ok()
                } else {
                    None
                }
            })
            .collect();
        Self::from_schema(schema, language_refsets)
    }

    fn from_schema(schema: Schema, language_refsets: Vec<SctId>) -> IndexResult<Self> {
        Ok(Self {
            term: schema.get_field(TERM)?,
            nterm: schema.get_field(NTERM)?,
            length_boost: schema.get_field(LENGTH_BOOST)?,
            id: schema.get_field(ID)?,
            description_id: schema.get_field(DESCRIPTION_ID)?,
            concept_id: schema.get_field(CONCEPT_ID)?,
            module_id: schema.get_field(MODULE_ID)?,
            type_id: schema.get_field(TYPE_ID)?,
            concept_active: schema.get_field(CONCEPT_ACTIVE)?,
            description_active: schema.get_field(DESCRIPTION_ACTIVE)?,
            preferred_in: schema.get_field(PREFERRED_IN)?,
            acceptable_in: schema.get_field(ACCEPTABLE_IN)?,
            concept_refsets: schema.get_field(CONCEPT_REFSETS)?,
            description_refsets: schema.get_field(DESCRIPTION_REFSETS)?,
            language_refsets,
            schema,
        })
    }

    /// The transitive-parent field for a relationship type, if indexed.
    pub fn transitive_field(&self, type_id: SctId) -> Option<Field> {
        self.schema.get_field(&type_id.to_string()).ok()
    }

    /// The direct-parent field for a relationship type, if indexed.
    pub fn direct_field(&self, type_id: SctId) -> Option<Field> {
        self.schema.get_field(&format!("d{type_id}")).ok()
    }

    /// The direct-parent count field for a relationship type, if indexed.
    pub fn count_field(&self, type_id: SctId) -> Option<Field> {
        self.schema.get_field(&format!("c{type_id}")).ok()
    }

    /// The concrete-value field for a type, with `true` when numeric.
    pub fn concrete_field(&self, type_id: SctId) -> Option<(Field, bool)> {
        let field = self.schema.get_field(&format!("v{type_id}")).ok()?;
        let numeric = !matches!(
            self.schema.get_field_entry(field).field_type(),
            tantivy::schema::FieldType::Str(_)
        );
        Some((field, numeric))
    }

    /// The stored preferred-synonym field for a language refset.
    pub fn refset_term_field(&self, refset_id: SctId) -> Option<Field> {
        self.language_refsets
            .contains(&refset_id)
            .then(|| self.schema.get_field(&refset_id.to_string()).ok())
            .flatten()
    }
}

/// Registers the folding analyzer on an index. Must run on both newly
/// created and reopened indexes.
pub fn register_tokenizers(index: &Index) {
    let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .build();
    index.tokenizers().register(FOLDING_TOKENIZER, analyzer);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> IndexSpec {
        IndexSpec {
            relationship_types: vec![116680003, 116676008],
            concrete_types: vec![(1142135004, true), (999000001109, false)],
            language_refsets: vec![900000000000508004, 900000000000509007],
        }
    }

    #[test]
    fn test_dynamic_fields_present() {
        let schema = SearchSchema::build(&spec()).unwrap();
        assert!(schema.transitive_field(116680003).is_some());
        assert!(schema.direct_field(116676008).is_some());
        assert!(schema.count_field(116676008).is_some());
        assert!(schema.transitive_field(404684003).is_none());

        let (_, numeric) = schema.concrete_field(1142135004).unwrap();
        assert!(numeric);
        let (_, numeric) = schema.concrete_field(999000001109).unwrap();
        assert!(!numeric);

        assert!(schema.refset_term_field(900000000000508004).is_some());
        assert!(schema.refset_term_field(554461000005103).is_none());
    }

    #[test]
    fn test_round_trip_through_index() {
        let schema = SearchSchema::build(&spec()).unwrap();
        let index = Index::create_in_ram(schema.schema.clone());
        let reopened = SearchSchema::from_index(&index).unwrap();
        assert_eq!(
            reopened.language_refsets,
            vec![900000000000508004, 900000000000509007]
        );
        assert!(reopened.transitive_field(116680003).is_some());
    }
}
