//! Flat dotted-key parameter store.
//!
//! Presents a TOML document through the host's [`ParamSource`] interface.
//! Nested tables join their keys with `.`, arrays map to 1-based indices, and
//! every scalar is stored as its string form:
//!
//! ```toml
//! [1]
//! get = [{ name = "q", value = "$(0)" }]
//! ```
//!
//! yields `"1.get.1.name" = "q"` and `"1.get.1.value" = "$(0)"`.

use std::collections::{BTreeMap, BTreeSet};

use webgetter_core::{ParamError, ParamResult, ParamSource};

/// String parameters keyed by dotted path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatParams {
    values: BTreeMap<String, String>,
}

impl FlatParams {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a TOML value. A non-table root is stored under the empty key.
    #[must_use]
    pub fn from_toml(value: &toml::Value) -> Self {
        let mut params = Self::new();
        flatten_into(value, "", &mut params.values);
        params
    }

    /// Set a parameter.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Set a parameter, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Raw value of a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlatParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

fn flatten_into(value: &toml::Value, prefix: &str, out: &mut BTreeMap<String, String>) {
    match value {
        toml::Value::Table(table) => {
            for (key, child) in table {
                flatten_into(child, &join(prefix, key), out);
            }
        },
        toml::Value::Array(items) => {
            for (position, child) in items.iter().enumerate() {
                let index = position.saturating_add(1).to_string();
                flatten_into(child, &join(prefix, &index), out);
            }
        },
        toml::Value::String(s) => {
            out.insert(prefix.to_owned(), s.clone());
        },
        toml::Value::Integer(i) => {
            out.insert(prefix.to_owned(), i.to_string());
        },
        toml::Value::Float(f) => {
            out.insert(prefix.to_owned(), f.to_string());
        },
        toml::Value::Boolean(b) => {
            out.insert(prefix.to_owned(), b.to_string());
        },
        toml::Value::Datetime(d) => {
            out.insert(prefix.to_owned(), d.to_string());
        },
    }
}

fn parse_bool_value(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ParamSource for FlatParams {
    fn param_names(&self) -> BTreeSet<String> {
        self.values.keys().cloned().collect()
    }

    fn has_param(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn parse_string(&self, key: &str, default: Option<&str>) -> ParamResult<String> {
        match (self.values.get(key), default) {
            (Some(value), _) => Ok(value.clone()),
            (None, Some(default)) => Ok(default.to_owned()),
            (None, None) => Err(ParamError::Missing {
                key: key.to_owned(),
            }),
        }
    }

    fn parse_int(&self, key: &str, default: Option<i64>) -> ParamResult<i64> {
        match (self.values.get(key), default) {
            (Some(raw), _) => raw.trim().parse().map_err(|_| ParamError::Invalid {
                key: key.to_owned(),
                expected: "integer",
                value: raw.clone(),
            }),
            (None, Some(default)) => Ok(default),
            (None, None) => Err(ParamError::Missing {
                key: key.to_owned(),
            }),
        }
    }

    fn parse_bool(&self, key: &str, default: Option<bool>) -> ParamResult<bool> {
        match (self.values.get(key), default) {
            (Some(raw), _) => parse_bool_value(raw).ok_or_else(|| ParamError::Invalid {
                key: key.to_owned(),
                expected: "boolean",
                value: raw.clone(),
            }),
            (None, Some(default)) => Ok(default),
            (None, None) => Err(ParamError::Missing {
                key: key.to_owned(),
            }),
        }
    }
}
