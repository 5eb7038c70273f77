use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use indexmap::map::Iter;

/// A leaf value of a flattened configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum FlatValue {
    Null,
    Bool(bool),
    Number(serde_yaml::Number),
    String(String),
    /// A YAML sequence of scalars, kept whole as a single entry.
    List(Vec<FlatValue>),
}

impl FlatValue {
    /// `true` for values the emitter drops entirely: null and the empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            FlatValue::Null => true,
            FlatValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Null, `false`, zero, the empty string and the empty list.
    pub fn is_falsy(&self) -> bool {
        match self {
            FlatValue::Null => true,
            FlatValue::Bool(b) => !b,
            FlatValue::Number(n) => n.as_f64() == Some(0.0),
            FlatValue::String(s) => s.is_empty(),
            FlatValue::List(items) => items.is_empty(),
        }
    }

    /// The text form used for derivation and for shell output.
    ///
    /// Null renders as the empty string and booleans as `True`/`False`, the
    /// spelling existing build scripts compare against. List elements are
    /// joined by a space.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FlatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlatValue::Null => Ok(()),
            FlatValue::Bool(true) => f.write_str("True"),
            FlatValue::Bool(false) => f.write_str("False"),
            FlatValue::Number(n) => write!(f, "{n}"),
            FlatValue::String(s) => f.write_str(s),
            FlatValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for FlatValue {
    fn from(s: &str) -> Self {
        FlatValue::String(s.to_string())
    }
}

impl From<String> for FlatValue {
    fn from(s: String) -> Self {
        FlatValue::String(s)
    }
}

impl From<bool> for FlatValue {
    fn from(b: bool) -> Self {
        FlatValue::Bool(b)
    }
}

impl From<i64> for FlatValue {
    fn from(i: i64) -> Self {
        FlatValue::Number(i.into())
    }
}

/// Single-level configuration keyed by joined paths, in insertion order.
///
/// Replacing the value of an existing key keeps the key at its original
/// position, so output order is fixed by the first time a key was seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatConfig {
    entries: IndexMap<String, FlatValue>,
}

impl FlatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FlatValue>) -> Option<FlatValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&FlatValue> {
        self.entries.get(key)
    }

    /// Text form of a value, if the key is present.
    pub fn text(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(FlatValue::to_text)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> Iter<'_, String, FlatValue> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a FlatConfig {
    type Item = (&'a String, &'a FlatValue);
    type IntoIter = Iter<'a, String, FlatValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Into<String>, V: Into<FlatValue>> FromIterator<(K, V)> for FlatConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = FlatConfig::new();
        for (k, v) in iter {
            config.insert(k, v);
        }
        config
    }
}

/// An operation requested from the command line, independent of any CLI
/// framework. The clap layer converts parsed args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Print shell statements for a YAML config.
    Load { config: PathBuf },
    /// Run the toolchain checks.
    Verify {
        json: bool,
        python: Option<String>,
    },
}
