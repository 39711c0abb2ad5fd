//! Expression results and the XPath type conversions.

use crate::dom::{Document, NodeRef};

/// The result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Nodes in document order, without duplicates.
    NodeSet(Vec<NodeRef>),
    /// A string.
    String(String),
    /// A double-precision number.
    Number(f64),
    /// A boolean.
    Boolean(bool),
}

impl Value {
    /// `boolean()` conversion.
    #[must_use]
    pub fn to_boolean(&self) -> bool {
        match self {
            Self::NodeSet(nodes) => !nodes.is_empty(),
            Self::String(s) => !s.is_empty(),
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Boolean(b) => *b,
        }
    }

    /// `number()` conversion.
    #[must_use]
    pub fn to_number(&self, doc: &Document) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            },
            other => string_to_number(&other.to_xpath_string(doc)),
        }
    }

    /// `string()` conversion. A node-set converts to the string-value of its
    /// first node.
    #[must_use]
    pub fn to_xpath_string(&self, doc: &Document) -> String {
        match self {
            Self::NodeSet(nodes) => nodes
                .first()
                .map(|n| doc.string_value(*n))
                .unwrap_or_default(),
            Self::String(s) => s.clone(),
            Self::Number(n) => number_to_string(*n),
            Self::Boolean(b) => b.to_string(),
        }
    }

    /// The nodes of a node-set result.
    #[must_use]
    pub fn as_nodes(&self) -> Option<&[NodeRef]> {
        match self {
            Self::NodeSet(nodes) => Some(nodes),
            _ => None,
        }
    }

    /// Whether this is a node-set.
    #[must_use]
    pub fn is_node_set(&self) -> bool {
        matches!(self, Self::NodeSet(_))
    }
}

/// Format a number the way `string()` does: integral values without a
/// fractional part, `NaN`, `Infinity` and `-Infinity`.
#[must_use]
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_owned()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_owned()
        } else {
            "-Infinity".to_owned()
        }
    } else if n == 0.0 {
        "0".to_owned()
    } else {
        format!("{n}")
    }
}

/// Parse a string the way `number()` does: optional whitespace, an optional
/// minus sign and a plain decimal. Anything else is `NaN`.
#[must_use]
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let mut seen_digit = false;
    let mut seen_dot = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return f64::NAN,
        }
    }
    if !seen_digit {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(3.0), "3");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(2.5), "2.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(1e21), "1000000000000000000000");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number(" 42 "), 42.0);
        assert_eq!(string_to_number("-1.5"), -1.5);
        assert_eq!(string_to_number(".5"), 0.5);
        assert_eq!(string_to_number("5."), 5.0);
        assert!(string_to_number("1e3").is_nan());
        assert!(string_to_number("+1").is_nan());
        assert!(string_to_number("").is_nan());
        assert!(string_to_number("-").is_nan());
        assert!(string_to_number("inf").is_nan());
    }

    #[test]
    fn test_boolean_conversion() {
        assert!(!Value::Number(f64::NAN).to_boolean());
        assert!(!Value::String(String::new()).to_boolean());
        assert!(Value::String("false".into()).to_boolean());
        assert!(!Value::NodeSet(Vec::new()).to_boolean());
    }
}
