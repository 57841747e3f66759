//! The query algebra.
//!
//! Combinators over index queries: set operators over the hierarchy
//! fields, refset membership, attribute and concrete-value constraints,
//! and boolean composition. Hierarchy operators that need ancestor sets
//! (`ancestorOf`, top/bottom of set) realize them against the store and
//! query the index by concept-id set.

use std::collections::HashSet;
use std::ops::Bound;

use snomed_store::SnomedStore;
use snomed_types::{well_known, SctId};
use tantivy::query::{
    AllQuery, BooleanQuery, EmptyQuery, Occur, Query, RangeQuery, TermQuery, TermSetQuery,
};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::Term;

use crate::error::{QueryError, QueryResult};
use crate::schema::SearchSchema;

/// Query combinators bound to one schema and store.
pub struct Queries<'a> {
    schema: &'a SearchSchema,
    store: &'a SnomedStore,
}

impl<'a> Queries<'a> {
    /// Creates the combinator set.
    pub fn new(schema: &'a SearchSchema, store: &'a SnomedStore) -> Self {
        Self { schema, store }
    }

    fn term_u64(field: Field, value: u64) -> Box<dyn Query> {
        Box::new(TermQuery::new(Term::from_field_u64(field, value), IndexRecordOption::Basic))
    }

    /// Documents of the concept itself.
    pub fn self_of(&self, concept_id: SctId) -> Box<dyn Query> {
        Self::term_u64(self.schema.concept_id, concept_id)
    }

    /// Documents of strict descendants of the concept.
    pub fn descendant_of(&self, concept_id: SctId) -> Box<dyn Query> {
        match self.schema.transitive_field(well_known::IS_A) {
            Some(field) => Self::term_u64(field, concept_id),
            None => Box::new(EmptyQuery),
        }
    }

    /// Documents of the concept or its descendants.
    pub fn descendant_or_self_of(&self, concept_id: SctId) -> Box<dyn Query> {
        self.or_of(vec![self.self_of(concept_id), self.descendant_of(concept_id)])
    }

    /// Documents of direct children of the concept.
    pub fn child_of(&self, concept_id: SctId) -> Box<dyn Query> {
        match self.schema.direct_field(well_known::IS_A) {
            Some(field) => Self::term_u64(field, concept_id),
            None => Box::new(EmptyQuery),
        }
    }

    /// Documents of direct parents of the concept (realized store-side).
    pub fn parent_of(&self, concept_id: SctId) -> QueryResult<Box<dyn Query>> {
        let parents: HashSet<SctId> =
            self.store.get_parents(concept_id)?.into_iter().collect();
        Ok(self.concept_id_set(&parents))
    }

    /// Documents of strict ancestors of the concept (realized store-side).
    pub fn ancestor_of(&self, concept_id: SctId) -> QueryResult<Box<dyn Query>> {
        let mut ancestors = self.store.all_ancestors(concept_id)?;
        ancestors.remove(&concept_id);
        Ok(self.concept_id_set(&ancestors))
    }

    /// Documents of the concept or its ancestors.
    pub fn ancestor_or_self_of(&self, concept_id: SctId) -> QueryResult<Box<dyn Query>> {
        let mut ancestors = self.store.all_ancestors(concept_id)?;
        ancestors.insert(concept_id);
        Ok(self.concept_id_set(&ancestors))
    }

    /// Documents of concepts that are members of the refset.
    pub fn member_of(&self, refset_id: SctId) -> Box<dyn Query> {
        Self::term_u64(self.schema.concept_refsets, refset_id)
    }

    /// Documents of concepts that are members of any refset at all.
    pub fn member_of_any(&self) -> Box<dyn Query> {
        Box::new(RangeQuery::new(
            Bound::Included(Term::from_field_u64(self.schema.concept_refsets, 0)),
            Bound::Included(Term::from_field_u64(self.schema.concept_refsets, u64::MAX)),
        ))
    }

    /// Documents whose concept id is in the given set.
    pub fn concept_id_set(&self, ids: &HashSet<SctId>) -> Box<dyn Query> {
        if ids.is_empty() {
            return Box::new(EmptyQuery);
        }
        let terms: Vec<Term> =
            ids.iter().map(|&id| Term::from_field_u64(self.schema.concept_id, id)).collect();
        Box::new(TermSetQuery::new(terms))
    }

    /// `<type> = value`: the attribute's destination is `value` or a
    /// descendant-of-`value` (the transitive field holds each
    /// destination with its ancestors).
    pub fn attribute_descendant_or_self_of(
        &self,
        type_id: SctId,
        value: SctId,
    ) -> Box<dyn Query> {
        match self.schema.transitive_field(type_id) {
            Some(field) => Self::term_u64(field, value),
            None => Box::new(EmptyQuery),
        }
    }

    /// `d<type> = value`: the attribute's destination is exactly `value`.
    pub fn attribute_exactly_equal(&self, type_id: SctId, value: SctId) -> Box<dyn Query> {
        match self.schema.direct_field(type_id) {
            Some(field) => Self::term_u64(field, value),
            None => Box::new(EmptyQuery),
        }
    }

    /// Documents with at least one destination for the attribute type.
    pub fn attribute_any(&self, type_id: SctId) -> Box<dyn Query> {
        match self.schema.direct_field(type_id) {
            Some(field) => Box::new(RangeQuery::new(
                Bound::Included(Term::from_field_u64(field, 0)),
                Bound::Included(Term::from_field_u64(field, u64::MAX)),
            )),
            None => Box::new(EmptyQuery),
        }
    }

    /// Cardinality constraint over the direct-parent count of a type.
    ///
    /// `[0..0]` matches concepts with no such attribute, `[0..*]` is
    /// match-all; `max < min` is a caller error.
    pub fn attribute_count(
        &self,
        type_id: SctId,
        min: u32,
        max: Option<u32>,
    ) -> QueryResult<Box<dyn Query>> {
        if let Some(max) = max {
            if max < min {
                return Err(QueryError::InvalidCardinality { min, max });
            }
        }
        let Some(field) = self.schema.count_field(type_id) else {
            // The type was never ingested: only [0..n] constraints match.
            return Ok(if min == 0 { Box::new(AllQuery) } else { Box::new(EmptyQuery) });
        };
        let count_range = |low: u64, high: u64| -> Box<dyn Query> {
            Box::new(RangeQuery::new(
                Bound::Included(Term::from_field_u64(field, low)),
                Bound::Included(Term::from_field_u64(field, high)),
            ))
        };
        Ok(match (min, max) {
            (0, Some(0)) => self.not_of(Box::new(AllQuery), count_range(1, u64::MAX)),
            (0, None) => Box::new(AllQuery),
            (min, None) => count_range(min as u64, u64::MAX),
            (0, Some(max)) => {
                // Zero is expressed by the absence of the count field.
                self.or_of(vec![
                    self.not_of(Box::new(AllQuery), count_range(1, u64::MAX)),
                    count_range(1, max as u64),
                ])
            }
            (min, Some(max)) => count_range(min as u64, max as u64),
        })
    }

    /// Numeric concrete-value comparison over `v<type>`.
    pub fn concrete_numeric(
        &self,
        type_id: SctId,
        comparison: NumericComparison,
        value: f64,
    ) -> QueryResult<Box<dyn Query>> {
        let Some((field, numeric)) = self.schema.concrete_field(type_id) else {
            return Ok(Box::new(EmptyQuery));
        };
        if !numeric {
            return Err(QueryError::Unsupported(format!(
                "numeric comparison over non-numeric concrete attribute {type_id}"
            )));
        }
        let bound = |v: f64| Term::from_field_f64(field, v);
        Ok(Box::new(match comparison {
            NumericComparison::Equal => {
                return Ok(Box::new(TermQuery::new(bound(value), IndexRecordOption::Basic)))
            }
            NumericComparison::Less => {
                RangeQuery::new(Bound::Unbounded, Bound::Excluded(bound(value)))
            }
            NumericComparison::LessOrEqual => {
                RangeQuery::new(Bound::Unbounded, Bound::Included(bound(value)))
            }
            NumericComparison::Greater => {
                RangeQuery::new(Bound::Excluded(bound(value)), Bound::Unbounded)
            }
            NumericComparison::GreaterOrEqual => {
                RangeQuery::new(Bound::Included(bound(value)), Bound::Unbounded)
            }
        }))
    }

    /// String concrete-value equality over `v<type>`.
    pub fn concrete_string(&self, type_id: SctId, value: &str) -> Box<dyn Query> {
        match self.schema.concrete_field(type_id) {
            Some((field, false)) => Box::new(TermQuery::new(
                Term::from_field_text(field, value),
                IndexRecordOption::Basic,
            )),
            _ => Box::new(EmptyQuery),
        }
    }

    /// Conjunction.
    pub fn and_of(&self, queries: Vec<Box<dyn Query>>) -> Box<dyn Query> {
        Box::new(BooleanQuery::new(
            queries.into_iter().map(|q| (Occur::Must, q)).collect(),
        ))
    }

    /// Disjunction.
    pub fn or_of(&self, queries: Vec<Box<dyn Query>>) -> Box<dyn Query> {
        Box::new(BooleanQuery::new(
            queries.into_iter().map(|q| (Occur::Should, q)).collect(),
        ))
    }

    /// Difference: `include MINUS exclude`.
    pub fn not_of(&self, include: Box<dyn Query>, exclude: Box<dyn Query>) -> Box<dyn Query> {
        Box::new(BooleanQuery::new(vec![(Occur::Must, include), (Occur::MustNot, exclude)]))
    }

    /// The most general members of a concept set.
    pub fn top_of_set(&self, ids: &HashSet<SctId>) -> QueryResult<Box<dyn Query>> {
        let top = self.store.top_of_set(ids)?;
        Ok(self.concept_id_set(&top))
    }

    /// The most specific members of a concept set.
    pub fn bottom_of_set(&self, ids: &HashSet<SctId>) -> QueryResult<Box<dyn Query>> {
        let bottom = self.store.bottom_of_set(ids)?;
        Ok(self.concept_id_set(&bottom))
    }
}

/// Comparison operators for numeric concrete values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericComparison {
    /// `=`
    Equal,
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_cardinality_rejected() {
        // Field resolution is irrelevant for the validation check, so a
        // minimal schema and store suffice.
        let dir = tempfile::tempdir().unwrap();
        let store = SnomedStore::open(dir.path().join("store.db")).unwrap();
        let schema = crate::schema::SearchSchema::build(&crate::schema::IndexSpec {
            relationship_types: vec![well_known::IS_A],
            ..Default::default()
        })
        .unwrap();
        let queries = Queries::new(&schema, &store);
        let err = queries.attribute_count(well_known::IS_A, 3, Some(1)).unwrap_err();
        assert!(matches!(err, QueryError::InvalidCardinality { min: 3, max: 1 }));
    }
}
