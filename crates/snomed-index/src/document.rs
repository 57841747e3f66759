//! Per-description document assembly.

use std::collections::HashMap;

use snomed_store::SnomedStore;
use snomed_types::{ConcreteValue, ExtendedConcept, SctId};
use tantivy::TantivyDocument;

use crate::error::IndexResult;
use crate::schema::SearchSchema;

fn active_term(active: bool) -> &'static str {
    if active {
        "1"
    } else {
        "0"
    }
}

/// Builds one document per description of an extended concept.
pub fn build_documents(
    schema: &SearchSchema,
    store: &SnomedStore,
    extended: &ExtendedConcept,
) -> IndexResult<Vec<TantivyDocument>> {
    let concept = &extended.concept;

    // Acceptability per description, and from it the concept-level map
    // of preferred synonym per language refset.
    let mut acceptability = Vec::with_capacity(extended.descriptions.len());
    let mut preferred_terms: HashMap<SctId, &str> = HashMap::new();
    for description in &extended.descriptions {
        let (preferred_in, acceptable_in) = store.description_acceptability(description.id)?;
        if description.active && description.is_synonym() {
            for &refset in &preferred_in {
                preferred_terms.entry(refset).or_insert(description.term.as_str());
            }
        }
        acceptability.push((preferred_in, acceptable_in));
    }

    let mut documents = Vec::with_capacity(extended.descriptions.len());
    for (description, (preferred_in, acceptable_in)) in
        extended.descriptions.iter().zip(&acceptability)
    {
        let mut doc = TantivyDocument::new();
        doc.add_text(schema.term, &description.term);
        doc.add_text(schema.nterm, &description.term);
        let length = description.term.chars().count().max(1);
        doc.add_f64(schema.length_boost, 1.0 / (length as f64).sqrt());
        doc.add_u64(schema.id, description.id);
        doc.add_u64(schema.description_id, description.id);
        doc.add_u64(schema.concept_id, concept.id);
        doc.add_u64(schema.module_id, description.module_id);
        doc.add_u64(schema.type_id, description.type_id);
        doc.add_text(schema.concept_active, active_term(concept.active));
        doc.add_text(schema.description_active, active_term(description.active));

        for (&type_id, destinations) in &extended.parent_relationships {
            if let Some(field) = schema.transitive_field(type_id) {
                for &destination in destinations {
                    doc.add_u64(field, destination);
                }
            }
        }
        for (&type_id, destinations) in &extended.direct_parent_relationships {
            if let Some(field) = schema.direct_field(type_id) {
                for &destination in destinations {
                    doc.add_u64(field, destination);
                }
            }
            if let Some(field) = schema.count_field(type_id) {
                doc.add_u64(field, destinations.len() as u64);
            }
        }
        for concrete in &extended.concrete_values {
            if let Some((field, numeric)) = schema.concrete_field(concrete.type_id) {
                match (&concrete.value, numeric) {
                    (ConcreteValue::Number(n), true) => doc.add_f64(field, *n),
                    (ConcreteValue::Number(n), false) => doc.add_text(field, n.to_string()),
                    (ConcreteValue::Text(s), false) => doc.add_text(field, s),
                    (ConcreteValue::Boolean(b), false) => doc.add_text(field, b.to_string()),
                    _ => {}
                }
            }
        }

        for &refset in preferred_in {
            doc.add_u64(schema.preferred_in, refset);
        }
        for &refset in acceptable_in {
            doc.add_u64(schema.acceptable_in, refset);
        }
        for &refset in &extended.refsets {
            doc.add_u64(schema.concept_refsets, refset);
        }
        for refset in store.get_component_refset_ids(description.id)? {
            doc.add_u64(schema.description_refsets, refset);
        }
        for (&refset, term) in &preferred_terms {
            if let Some(field) = schema.refset_term_field(refset) {
                doc.add_text(field, term);
            }
        }

        documents.push(doc);
    }
    Ok(documents)
}
