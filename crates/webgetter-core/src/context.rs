//! Per-invocation substitution context.
//!
//! A [`Context`] maps keys (`"language"`, `"0"`, `"vars.1"`, ...) to either a
//! single string or a list of strings. Keys are kept in sorted order so that
//! the enumeration used by the placeholder formatter is fixed for the
//! lifetime of the context, and identical inputs always render identically.

use std::collections::BTreeMap;
use std::fmt;

use crate::locale::Locale;

/// Separator used when a list value is rendered as a single string.
const LIST_SEPARATOR: &str = ", ";

/// A context value: one string, or the ordered results of a multi-node query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A single string.
    Text(String),
    /// An ordered list of strings.
    List(Vec<String>),
}

impl Value {
    /// The string, if this is a [`Value::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::List(_) => None,
        }
    }

    /// The items, if this is a [`Value::List`].
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::Text(_) => None,
            Self::List(items) => Some(items),
        }
    }

    /// Whether this value is list-valued.
    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Collapse a list of extracted strings: none becomes `""`, one becomes
    /// that string, more stay a list.
    #[must_use]
    pub fn collapse(mut items: Vec<String>) -> Self {
        match items.len() {
            0 => Self::Text(String::new()),
            1 => Self::Text(items.pop().unwrap_or_default()),
            _ => Self::List(items),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::List(items) => f.write_str(&items.join(LIST_SEPARATOR)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// Key/value mapping used for template substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    entries: BTreeMap<String, Value>,
}

impl Context {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the context for a chat invocation.
    ///
    /// Adds the locale fields (`language`, `region`, `locale`, `locale2`),
    /// `"0"` holding everything after the trigger word, and `"1"`..`"n"`
    /// holding the individual words after it.
    #[must_use]
    pub fn for_invocation(locale: &Locale, text: &str) -> Self {
        let mut ctx = Self::new();
        ctx.insert("language", locale.language());
        ctx.insert("region", locale.region());
        ctx.insert("locale", locale.tag());
        ctx.insert("locale2", locale.tag().replace('_', "-"));

        let words: Vec<&str> = text.split_whitespace().collect();
        let rest = words.get(1..).map(|w| w.join(" ")).unwrap_or_default();
        ctx.insert("0", rest);
        for (i, word) in words.iter().enumerate().skip(1) {
            ctx.insert(i.to_string(), *word);
        }
        ctx
    }

    /// Insert a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Look up a value for modification.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    /// Whether the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the context has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate mutably over entries in enumeration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over keys in enumeration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Keys holding list values, in enumeration order.
    #[must_use]
    pub fn list_keys(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, v)| v.is_list())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// The context for row `row`: list values are replaced by their `row`-th
    /// item (or `""` if shorter), scalars are copied.
    #[must_use]
    pub fn row(&self, row: usize) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    Value::Text(s) => Value::Text(s.clone()),
                    Value::List(items) => Value::Text(items.get(row).cloned().unwrap_or_default()),
                };
                (k.clone(), value)
            })
            .collect();
        Self { entries }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fr() -> Locale {
        Locale::parse("fr_FR")
    }

    #[test]
    fn test_invocation_tokens() {
        let ctx = Context::for_invocation(&fr(), "weather  new   york");
        assert_eq!(ctx.get("0"), Some(&Value::from("new york")));
        assert_eq!(ctx.get("1"), Some(&Value::from("new")));
        assert_eq!(ctx.get("2"), Some(&Value::from("york")));
        assert!(!ctx.contains_key("3"));
    }

    #[test]
    fn test_invocation_without_arguments() {
        let ctx = Context::for_invocation(&fr(), "weather");
        assert_eq!(ctx.get("0"), Some(&Value::from("")));
        assert!(!ctx.contains_key("1"));
    }

    #[test]
    fn test_invocation_locale_fields() {
        let ctx = Context::for_invocation(&fr(), "weather paris");
        assert_eq!(ctx.get("language"), Some(&Value::from("fr")));
        assert_eq!(ctx.get("region"), Some(&Value::from("FR")));
        assert_eq!(ctx.get("locale"), Some(&Value::from("fr_FR")));
        assert_eq!(ctx.get("locale2"), Some(&Value::from("fr-FR")));
    }

    #[test]
    fn test_collapse() {
        assert_eq!(Value::collapse(vec![]), Value::from(""));
        assert_eq!(Value::collapse(vec!["a".into()]), Value::from("a"));
        assert_eq!(
            Value::collapse(vec!["a".into(), "b".into()]),
            Value::List(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_list_display_joins_items() {
        let v = Value::List(vec!["a".into(), "b".into()]);
        assert_eq!(v.to_string(), "a, b");
    }

    #[test]
    fn test_row_selects_item_and_copies_scalars() {
        let mut ctx = Context::new();
        ctx.insert("vars.1", vec!["a".to_string(), "b".to_string()]);
        ctx.insert("0", "paris");

        let row = ctx.row(1);
        assert_eq!(row.get("vars.1"), Some(&Value::from("b")));
        assert_eq!(row.get("0"), Some(&Value::from("paris")));
        assert!(row.list_keys().is_empty());
    }

    #[test]
    fn test_enumeration_order_is_sorted() {
        let ctx: Context = [("b", "B"), ("a", "A"), ("vars.1", "x")].into_iter().collect();
        let keys: Vec<&str> = ctx.keys().collect();
        assert_eq!(keys, vec!["a", "b", "vars.1"]);
    }
}
