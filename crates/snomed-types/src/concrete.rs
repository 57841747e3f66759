//! Concrete-value relationships.
//!
//! Concrete relationships attach literal values (numbers, strings,
//! booleans) to concepts instead of destination concepts. They are
//! released in `sct2_RelationshipConcreteValues_*.txt` files, with the
//! value column carrying a one-character type prefix.

use std::fmt;

use crate::SctId;

/// A typed concrete value.
///
/// The RF2 encoding puts the type in the first character: `#` introduces
/// a number, `"` a quoted string; anything else is a boolean or an
/// untyped literal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConcreteValue {
    /// A numeric value, e.g. `#500` or `#0.5`.
    Number(f64),
    /// A string value, e.g. `"tablet"` (terminal quotes stripped).
    Text(String),
    /// A boolean value, `true` or `false`.
    Boolean(bool),
}

impl ConcreteValue {
    /// Parses an RF2 concrete-value literal.
    ///
    /// Returns `None` when a `#`-prefixed value does not parse as a
    /// number.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.as_bytes().first() {
            Some(b'#') => raw[1..].parse::<f64>().ok().map(ConcreteValue::Number),
            Some(b'"') => {
                let inner = raw.strip_prefix('"').unwrap_or(raw);
                let inner = inner.strip_suffix('"').unwrap_or(inner);
                Some(ConcreteValue::Text(inner.to_string()))
            }
            Some(_) => match raw {
                "true" | "1" => Some(ConcreteValue::Boolean(true)),
                "false" | "0" => Some(ConcreteValue::Boolean(false)),
                other => Some(ConcreteValue::Text(other.to_string())),
            },
            None => None,
        }
    }

    /// Returns the numeric value if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ConcreteValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string value if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConcreteValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ConcreteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcreteValue::Number(n) => write!(f, "#{}", n),
            ConcreteValue::Text(s) => write!(f, "\"{}\"", s),
            ConcreteValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// A relationship from a concept to a concrete value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConcreteRelationship {
    /// Unique identifier (SCTID, relationship partition).
    pub id: SctId,
    /// Effective date in YYYYMMDD format.
    pub effective_time: u32,
    /// Whether this relationship is active.
    pub active: bool,
    /// The module containing this relationship.
    pub module_id: SctId,
    /// Source concept.
    pub source_id: SctId,
    /// The raw RF2 value literal, type prefix included.
    pub value: String,
    /// Relationship group (0 = ungrouped).
    pub relationship_group: u32,
    /// Attribute type concept.
    pub type_id: SctId,
    /// Stated or inferred.
    pub characteristic_type_id: SctId,
    /// Existential or universal quantification.
    pub modifier_id: SctId,
}

impl ConcreteRelationship {
    /// Parses the value literal into its typed form.
    pub fn concrete_value(&self) -> Option<ConcreteValue> {
        ConcreteValue::parse(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(ConcreteValue::parse("#500"), Some(ConcreteValue::Number(500.0)));
        assert_eq!(ConcreteValue::parse("#0.5"), Some(ConcreteValue::Number(0.5)));
        assert_eq!(ConcreteValue::parse("#nope"), None);
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(
            ConcreteValue::parse("\"tablet\""),
            Some(ConcreteValue::Text("tablet".to_string()))
        );
        // Unterminated quote still yields the inner text
        assert_eq!(
            ConcreteValue::parse("\"mg"),
            Some(ConcreteValue::Text("mg".to_string()))
        );
    }

    #[test]
    fn test_parse_boolean_and_other() {
        assert_eq!(ConcreteValue::parse("true"), Some(ConcreteValue::Boolean(true)));
        assert_eq!(ConcreteValue::parse("false"), Some(ConcreteValue::Boolean(false)));
        assert_eq!(
            ConcreteValue::parse("other"),
            Some(ConcreteValue::Text("other".to_string()))
        );
        assert_eq!(ConcreteValue::parse(""), None);
    }
}
