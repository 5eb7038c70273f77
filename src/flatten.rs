//! Flattens a nested YAML document into joined key-value pairs.
//!
//! `{"apex": {"repo_url": "..."}}` becomes `[("apex_repo_url", "...")]`.
//! Traversal is depth-first in document order, and that order is kept in the
//! resulting [`FlatConfig`].

use serde_yaml::{Mapping, Value};
use tracing::warn;

use crate::error::BuildEnvError;
use crate::types::{FlatConfig, FlatValue};

/// Flatten `document`, joining nested keys with `separator`.
///
/// Mappings are recursed into; every other node is a leaf. A sequence is kept
/// whole as a [`FlatValue::List`] as long as its elements are scalars.
///
/// Two paths that join to the same key (`a: {b: 1}` and `a_b: 2`) do not
/// fail: the later value replaces the earlier one at the earlier position,
/// and a warning names the key.
pub fn flatten(document: &Value, separator: &str) -> Result<FlatConfig, BuildEnvError> {
    let Value::Mapping(mapping) = untagged(document) else {
        return Err(BuildEnvError::ConfigFormat {
            reason: format!(
                "top level must be a mapping, found {}",
                kind(untagged(document))
            ),
        });
    };
    let mut out = FlatConfig::new();
    flatten_mapping(mapping, "", separator, &mut out)?;
    Ok(out)
}

fn flatten_mapping(
    mapping: &Mapping,
    prefix: &str,
    separator: &str,
    out: &mut FlatConfig,
) -> Result<(), BuildEnvError> {
    for (key, value) in mapping {
        let path = joined(prefix, &key_text(key, prefix)?, separator);
        match untagged(value) {
            Value::Mapping(inner) => flatten_mapping(inner, &path, separator, out)?,
            leaf => {
                let value = leaf_value(leaf, &path)?;
                if out.insert(path.clone(), value).is_some() {
                    warn!(key = %path, "flattened key collision, later value wins");
                }
            }
        }
    }
    Ok(())
}

fn joined(prefix: &str, key: &str, separator: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}{separator}{key}")
    }
}

fn key_text(key: &Value, prefix: &str) -> Result<String, BuildEnvError> {
    match untagged(key) {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(FlatValue::Bool(*b).to_text()),
        Value::Null => Ok("None".to_string()),
        other => Err(BuildEnvError::ConfigFormat {
            reason: format!(
                "mapping keys must be scalars, found {} under '{prefix}'",
                kind(other)
            ),
        }),
    }
}

fn leaf_value(value: &Value, path: &str) -> Result<FlatValue, BuildEnvError> {
    match untagged(value) {
        Value::Null => Ok(FlatValue::Null),
        Value::Bool(b) => Ok(FlatValue::Bool(*b)),
        Value::Number(n) => Ok(FlatValue::Number(n.clone())),
        Value::String(s) => Ok(FlatValue::String(s.clone())),
        Value::Sequence(items) => items
            .iter()
            .map(|item| match untagged(item) {
                Value::Sequence(_) | Value::Mapping(_) => Err(BuildEnvError::ConfigFormat {
                    reason: format!("list '{path}' may only contain scalars"),
                }),
                scalar => leaf_value(scalar, path),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(FlatValue::List),
        Value::Mapping(_) => Err(BuildEnvError::ConfigFormat {
            reason: format!("'{path}' is a mapping, not a value"),
        }),
        Value::Tagged(_) => unreachable!("untagged() strips tags"),
    }
}

/// Strip YAML tags (`!foo value`) down to the tagged value.
fn untagged(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untagged(&tagged.value),
        other => other,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
