//! ECL abstract syntax tree and evaluator.

pub mod ast;
mod eval;

pub use ast::{
    AttributeConstraint, AttributeGroup, AttributeOperator, AttributeValue, Cardinality,
    CompoundOperator, ConceptReference, ConcreteComparison, ConcreteOperand, ConstraintOperator,
    EclExpression, FocusConcept, Refinement,
};
pub use eval::EclEvaluator;
