//! ECL evaluation: compiling an AST into index queries and realizing
//! concept sets.
//!
//! Hierarchy prefixes and attribute constraints translate directly to
//! the query algebra. Attribute types are subsumed — `attr = V` applies
//! to `attr` and every subtype of `attr` — and attribute values exploit
//! the transitive per-type fields, so `attr = << V` is a single term
//! query. Attribute groups evaluate as concept-level conjunctions;
//! groups carrying a cardinality are rejected as unsupported rather
//! than silently approximated.

use std::collections::HashSet;

use snomed_store::SnomedStore;
use snomed_types::{well_known, SctId};
use tantivy::query::Query;

use crate::collector::ConceptSetCollector;
use crate::ecl::ast::*;
use crate::error::{QueryError, QueryResult};
use crate::query::{NumericComparison, Queries};
use crate::SearchIndex;

/// Evaluates ECL expressions against a search index and its store.
pub struct EclEvaluator<'a> {
    index: &'a SearchIndex,
    store: &'a SnomedStore,
}

impl<'a> EclEvaluator<'a> {
    /// Creates an evaluator over one index/store pair.
    pub fn new(index: &'a SearchIndex, store: &'a SnomedStore) -> Self {
        Self { index, store }
    }

    fn queries(&self) -> Queries<'_> {
        Queries::new(&self.index.schema, self.store)
    }

    /// Executes an expression and materializes the distinct concept ids
    /// of its result set.
    pub fn realize(&self, expression: &EclExpression) -> QueryResult<HashSet<SctId>> {
        let query = self.compile(expression)?;
        self.realize_query(query.as_ref())
    }

    /// Executes an already compiled query.
    pub fn realize_query(&self, query: &dyn Query) -> QueryResult<HashSet<SctId>> {
        let searcher = self.index.reader.searcher();
        Ok(searcher.search(query, &ConceptSetCollector)?)
    }

    /// Splits an expression into `(include, exclude)` queries so a
    /// caller embedding it as a filter can reapply the exclusion as its
    /// own negative clause. Only a top-level `MINUS` produces an
    /// exclusion; everything else compiles to a pure include.
    pub fn rewrite(
        &self,
        expression: &EclExpression,
    ) -> QueryResult<(Box<dyn Query>, Option<Box<dyn Query>>)> {
        match expression {
            EclExpression::Compound { operator: CompoundOperator::Minus, operands }
                if !operands.is_empty() =>
            {
                let include = self.compile(&operands[0])?;
                let excluded: QueryResult<Vec<Box<dyn Query>>> =
                    operands[1..].iter().map(|operand| self.compile(operand)).collect();
                Ok((include, Some(self.queries().or_of(excluded?))))
            }
            other => Ok((self.compile(other)?, None)),
        }
    }

    /// Compiles an expression to an index query.
    pub fn compile(&self, expression: &EclExpression) -> QueryResult<Box<dyn Query>> {
        match expression {
            EclExpression::Constraint { operator, focus } => self.compile_constraint(*operator, focus),
            EclExpression::Refined { focus, refinement } => {
                let mut clauses = vec![self.compile(focus)?];
                for attribute in &refinement.attributes {
                    clauses.push(self.compile_attribute(attribute)?);
                }
                for group in &refinement.groups {
                    if group.cardinality.is_some() {
                        return Err(QueryError::Unsupported(
                            "attribute group cardinality".to_string(),
                        ));
                    }
                    for attribute in &group.attributes {
                        clauses.push(self.compile_attribute(attribute)?);
                    }
                }
                Ok(self.queries().and_of(clauses))
            }
            EclExpression::Compound { operator, operands } => {
                if operands.is_empty() {
                    return Err(QueryError::Unsupported("empty compound expression".to_string()));
                }
                let compiled: QueryResult<Vec<Box<dyn Query>>> =
                    operands.iter().map(|operand| self.compile(operand)).collect();
                let mut compiled = compiled?;
                let queries = self.queries();
                Ok(match operator {
                    CompoundOperator::And => queries.and_of(compiled),
                    CompoundOperator::Or => queries.or_of(compiled),
                    CompoundOperator::Minus => {
                        let include = compiled.remove(0);
                        if compiled.is_empty() {
                            include
                        } else {
                            queries.not_of(include, queries.or_of(compiled))
                        }
                    }
                })
            }
        }
    }

    fn compile_constraint(
        &self,
        operator: ConstraintOperator,
        focus: &FocusConcept,
    ) -> QueryResult<Box<dyn Query>> {
        let queries = self.queries();
        let concept_id = match focus {
            FocusConcept::Any => {
                // `*` is everything under the hierarchy root; `^ *` is
                // membership in any refset.
                return Ok(match operator {
                    ConstraintOperator::MemberOf => queries.member_of_any(),
                    _ => queries.descendant_or_self_of(well_known::SNOMED_CT_ROOT),
                });
            }
            FocusConcept::Reference(reference) => reference.id,
        };
        Ok(match operator {
            // An unprefixed concept reference selects the concept and
            // its descendants.
            ConstraintOperator::SelfOf | ConstraintOperator::DescendantOrSelfOf => {
                queries.descendant_or_self_of(concept_id)
            }
            ConstraintOperator::DescendantOf => queries.descendant_of(concept_id),
            ConstraintOperator::AncestorOf => queries.ancestor_of(concept_id)?,
            ConstraintOperator::AncestorOrSelfOf => queries.ancestor_or_self_of(concept_id)?,
            ConstraintOperator::ChildOf => queries.child_of(concept_id),
            ConstraintOperator::ParentOf => queries.parent_of(concept_id)?,
            ConstraintOperator::MemberOf => queries.member_of(concept_id),
        })
    }

    /// Attribute types subject to a constraint: the named type and all
    /// of its subtypes.
    fn expand_attribute_types(&self, attribute: SctId) -> QueryResult<Vec<SctId>> {
        let mut types = vec![attribute];
        types.extend(self.store.all_descendants(attribute)?);
        Ok(types)
    }

    fn compile_attribute(&self, constraint: &AttributeConstraint) -> QueryResult<Box<dyn Query>> {
        let queries = self.queries();
        let types = self.expand_attribute_types(constraint.attribute.id)?;

        let value_query = match &constraint.value {
            AttributeValue::Concrete { comparison, operand } => {
                self.compile_concrete(&types, *comparison, operand)?
            }
            AttributeValue::Expression(value) => self.compile_attribute_value(&types, value)?,
        };

        let positive = match constraint.operator {
            AttributeOperator::Equal => value_query,
            AttributeOperator::NotEqual => {
                // Some value of the attribute, none of them in the set.
                let any = queries
                    .or_of(types.iter().map(|&t| queries.attribute_any(t)).collect());
                queries.not_of(any, value_query)
            }
        };

        match constraint.cardinality {
            None => Ok(positive),
            Some(Cardinality { min, max }) => {
                // Counts apply to the named attribute type; the value
                // constraint is conjoined only for a positive minimum.
                let count = queries.attribute_count(constraint.attribute.id, min, max)?;
                if min > 0 {
                    Ok(queries.and_of(vec![count, positive]))
                } else {
                    Ok(count)
                }
            }
        }
    }

    fn compile_attribute_value(
        &self,
        types: &[SctId],
        value: &EclExpression,
    ) -> QueryResult<Box<dyn Query>> {
        let queries = self.queries();
        let per_type: Vec<Box<dyn Query>> = match value {
            EclExpression::Constraint { operator: _, focus: FocusConcept::Any } => {
                types.iter().map(|&t| queries.attribute_any(t)).collect()
            }
            // An unprefixed value is subsumed like `<<`.
            EclExpression::Constraint {
                operator: ConstraintOperator::SelfOf | ConstraintOperator::DescendantOrSelfOf,
                focus: FocusConcept::Reference(value),
            } => types
                .iter()
                .map(|&t| queries.attribute_descendant_or_self_of(t, value.id))
                .collect(),
            EclExpression::Constraint {
                operator: ConstraintOperator::DescendantOf,
                focus: FocusConcept::Reference(value),
            } => types
                .iter()
                .map(|&t| {
                    queries.not_of(
                        queries.attribute_descendant_or_self_of(t, value.id),
                        queries.attribute_exactly_equal(t, value.id),
                    )
                })
                .collect(),
            // Anything more elaborate: realize the value set and match
            // direct destinations against it.
            other => {
                let values = self.realize(other)?;
                types
                    .iter()
                    .map(|&t| {
                        let per_value: Vec<Box<dyn Query>> = values
                            .iter()
                            .map(|&v| queries.attribute_exactly_equal(t, v))
                            .collect();
                        queries.or_of(per_value)
                    })
                    .collect()
            }
        };
        Ok(queries.or_of(per_type))
    }

    fn compile_concrete(
        &self,
        types: &[SctId],
        comparison: ConcreteComparison,
        operand: &ConcreteOperand,
    ) -> QueryResult<Box<dyn Query>> {
        let queries = self.queries();
        let mut per_type = Vec::with_capacity(types.len());
        for &type_id in types {
            let query = match operand {
                ConcreteOperand::Number(value) => {
                    queries.concrete_numeric(type_id, numeric_comparison(comparison), *value)?
                }
                ConcreteOperand::Text(value) => {
                    if comparison != ConcreteComparison::Equal {
                        return Err(QueryError::Unsupported(
                            "ordered comparison over string concrete value".to_string(),
                        ));
                    }
                    queries.concrete_string(type_id, value)
                }
                ConcreteOperand::Boolean(value) => {
                    if comparison != ConcreteComparison::Equal {
                        return Err(QueryError::Unsupported(
                            "ordered comparison over boolean concrete value".to_string(),
                        ));
                    }
                    queries.concrete_string(type_id, if *value { "true" } else { "false" })
                }
            };
            per_type.push(query);
        }
        Ok(queries.or_of(per_type))
    }
}

fn numeric_comparison(comparison: ConcreteComparison) -> NumericComparison {
    match comparison {
        ConcreteComparison::Equal => NumericComparison::Equal,
        ConcreteComparison::Less => NumericComparison::Less,
        ConcreteComparison::LessOrEqual => NumericComparison::LessOrEqual,
        ConcreteComparison::Greater => NumericComparison::Greater,
        ConcreteComparison::GreaterOrEqual => NumericComparison::GreaterOrEqual,
    }
}
