//! Abstract syntax tree for Expression Constraint Language expressions.
//!
//! The tree is the interface an external ECL parser is expected to
//! produce; the evaluator in [`crate::ecl::EclEvaluator`] consumes it.

use snomed_types::SctId;

/// Hierarchy operator prefixing a focus concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum ConstraintOperator {
    /// No prefix: an unprefixed reference, evaluated like `<<` (the
    /// concept and its descendants).
    SelfOf,
    /// `<` strict descendants.
    DescendantOf,
    /// `<<` the concept and its descendants.
    DescendantOrSelfOf,
    /// `>` strict ancestors.
    AncestorOf,
    /// `>>` the concept and its ancestors.
    AncestorOrSelfOf,
    /// `<!` direct children.
    ChildOf,
    /// `>!` direct parents.
    ParentOf,
    /// `^` members of a refset.
    MemberOf,
}

/// A concept reference, optionally carrying the pipe-delimited term.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct ConceptReference {
    /// The referenced concept.
    pub id: SctId,
    /// Display term, e.g. `|Multiple sclerosis|`.
    pub term: Option<String>,
}

impl ConceptReference {
    /// A bare reference without a term.
    pub fn new(id: SctId) -> Self {
        Self { id, term: None }
    }
}

/// The focus of a constraint: a concept or the `*` wildcard.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum FocusConcept {
    /// A concept reference.
    Reference(ConceptReference),
    /// `*` — any concept.
    Any,
}

/// Binary set operators between subexpressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum CompoundOperator {
    /// `AND` / `,`
    And,
    /// `OR`
    Or,
    /// `MINUS`
    Minus,
}

/// Cardinality constraint, `[min..max]` with `None` for `*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Cardinality {
    /// Minimum occurrences.
    pub min: u32,
    /// Maximum occurrences, unbounded when `None`.
    pub max: Option<u32>,
}

/// Comparison operator of an attribute constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum AttributeOperator {
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
}

/// Comparison operator of a concrete-value constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum ConcreteComparison {
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

/// A literal concrete operand.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum ConcreteOperand {
    /// `#250`, `#0.5`
    Number(f64),
    /// `"tablet"`
    Text(String),
    /// `true` / `false`
    Boolean(bool),
}

/// The right-hand side of an attribute constraint.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum AttributeValue {
    /// A nested expression constraint.
    Expression(Box<EclExpression>),
    /// A concrete-value comparison.
    Concrete {
        /// The comparison operator.
        comparison: ConcreteComparison,
        /// The literal operand.
        operand: ConcreteOperand,
    },
}

/// One attribute constraint of a refinement.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct AttributeConstraint {
    /// Optional `[m..n]` cardinality.
    pub cardinality: Option<Cardinality>,
    /// The attribute type; subsumed when applied (`attr` means
    /// `descendantOrSelfOf(attr)`).
    pub attribute: ConceptReference,
    /// `=` or `!=`.
    pub operator: AttributeOperator,
    /// The constrained value.
    pub value: AttributeValue,
}

/// A group of attribute constraints that must co-occur.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct AttributeGroup {
    /// Optional group cardinality (not evaluated, see the evaluator).
    pub cardinality: Option<Cardinality>,
    /// The grouped constraints.
    pub attributes: Vec<AttributeConstraint>,
}

/// The refinement clause of `E : ...`.
#[derive(Debug, Clone, Default, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Refinement {
    /// Ungrouped attribute constraints, AND-combined.
    pub attributes: Vec<AttributeConstraint>,
    /// Attribute groups.
    pub groups: Vec<AttributeGroup>,
}

/// An ECL expression constraint.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum EclExpression {
    /// A (possibly prefixed) focus concept.
    Constraint {
        /// Hierarchy operator.
        operator: ConstraintOperator,
        /// The focus concept or wildcard.
        focus: FocusConcept,
    },
    /// A refined subexpression, `E : attr = V, ...`.
    Refined {
        /// The refined subexpression.
        focus: Box<EclExpression>,
        /// Its refinement clause.
        refinement: Refinement,
    },
    /// A compound expression, `A AND B`, `A OR B`, `A MINUS B`.
    Compound {
        /// The set operator.
        operator: CompoundOperator,
        /// Two or more operands, combined left to right.
        operands: Vec<EclExpression>,
    },
}

impl EclExpression {
    /// A bare concept reference (`c` with no prefix); evaluates as the
    /// concept or any of its descendants.
    pub fn concept(id: SctId) -> Self {
        Self::constraint(ConstraintOperator::SelfOf, id)
    }

    /// A prefixed concept reference.
    pub fn constraint(operator: ConstraintOperator, id: SctId) -> Self {
        EclExpression::Constraint {
            operator,
            focus: FocusConcept::Reference(ConceptReference::new(id)),
        }
    }

    /// The `*` wildcard.
    pub fn any() -> Self {
        EclExpression::Constraint { operator: ConstraintOperator::SelfOf, focus: FocusConcept::Any }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let expr = EclExpression::constraint(ConstraintOperator::DescendantOf, 24700007);
        match expr {
            EclExpression::Constraint { operator, focus } => {
                assert_eq!(operator, ConstraintOperator::DescendantOf);
                assert_eq!(focus, FocusConcept::Reference(ConceptReference::new(24700007)));
            }
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn test_serde_round_trip() {
        let expr = EclExpression::Compound {
            operator: CompoundOperator::Minus,
            operands: vec![
                EclExpression::constraint(ConstraintOperator::DescendantOrSelfOf, 404684003),
                EclExpression::constraint(ConstraintOperator::DescendantOrSelfOf, 73211009),
            ],
        };
        let json = serde_json::to_string(&expr).unwrap();
        let parsed: EclExpression = serde_json::from_str(&json).unwrap();
        assert_eq!(expr, parsed);
    }
}
