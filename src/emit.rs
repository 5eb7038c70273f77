//! Renders a [`FlatConfig`] as bash statements.
//!
//! Each retained entry becomes an `export` followed by a `readonly`. Entries
//! with a legacy alias get a second pair for the alias name right after.

use std::fmt;

use crate::env::{EnvLookup, expand_vars};
use crate::types::FlatConfig;

/// Canonical flattened key to the older variable name scripts still read.
pub const ALIASES: &[(&str, &str)] = &[
    ("transformer_engine_repo_url", "TE_REPO_URL"),
    ("transformer_engine_commit", "TE_COMMIT"),
];

pub fn alias_for(key: &str) -> Option<&'static str> {
    ALIASES
        .iter()
        .find_map(|(canonical, alias)| (*canonical == key).then_some(*alias))
}

/// Environment variable name for a flattened key.
pub fn normalize_key(key: &str) -> String {
    key.to_uppercase()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Export { name: String, value: String },
    Readonly { name: String },
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Export { name, value } => {
                write!(f, "export {name}='{}'", value.replace('\'', r"'\''"))
            }
            Statement::Readonly { name } => write!(f, "readonly {name}"),
        }
    }
}

/// Build the statements for `config` in iteration order.
///
/// Null and empty-string values are skipped. Every other value is expanded
/// against `env` in its text form.
pub fn statements(config: &FlatConfig, env: &dyn EnvLookup) -> Vec<Statement> {
    let mut out = Vec::with_capacity(config.len() * 2);
    for (key, value) in config {
        if value.is_blank() {
            continue;
        }
        let expanded = expand_vars(&value.to_text(), env);
        let names = std::iter::once(normalize_key(key)).chain(alias_for(key).map(String::from));
        for name in names {
            out.push(Statement::Export {
                name: name.clone(),
                value: expanded.clone(),
            });
            out.push(Statement::Readonly { name });
        }
    }
    out
}

/// The full script text, one statement per line.
pub fn render(config: &FlatConfig, env: &dyn EnvLookup) -> String {
    statements(config, env)
        .iter()
        .map(|s| format!("{s}\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::home_env;
    use crate::types::FlatValue;

    #[test]
    fn key_uppercased() {
        assert_eq!(normalize_key("pytorch_cuda_version"), "PYTORCH_CUDA_VERSION");
        assert_eq!(normalize_key(""), "");
    }

    #[test]
    fn export_then_readonly() {
        let config: FlatConfig = [("python_version", "3.10")].into_iter().collect();
        assert_eq!(
            render(&config, &home_env()),
            "export PYTHON_VERSION='3.10'\nreadonly PYTHON_VERSION\n"
        );
    }

    #[test]
    fn blank_values_skipped() {
        let mut config = FlatConfig::new();
        config.insert("empty", "");
        config.insert("nothing", FlatValue::Null);
        config.insert("zero", 0_i64);
        let text = render(&config, &home_env());
        assert!(!text.contains("EMPTY"));
        assert!(!text.contains("NOTHING"));
        assert!(text.contains("export ZERO='0'"));
    }

    #[test]
    fn booleans_capitalized() {
        let mut config = FlatConfig::new();
        config.insert("feature_enabled", true);
        config.insert("feature_debug", false);
        let text = render(&config, &home_env());
        assert!(text.contains("export FEATURE_ENABLED='True'\n"));
        assert!(text.contains("export FEATURE_DEBUG='False'\n"));
    }

    #[test]
    fn values_expanded() {
        let config: FlatConfig = [("workspace_src_dir", "$HOME/src")].into_iter().collect();
        assert!(render(&config, &home_env()).contains("export WORKSPACE_SRC_DIR='/home/ml/src'"));
    }

    #[test]
    fn alias_follows_canonical_entry() {
        let config: FlatConfig = [("transformer_engine_commit", "v2.1"), ("after", "x")]
            .into_iter()
            .collect();
        let lines: Vec<String> = statements(&config, &home_env())
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            lines,
            vec![
                "export TRANSFORMER_ENGINE_COMMIT='v2.1'",
                "readonly TRANSFORMER_ENGINE_COMMIT",
                "export TE_COMMIT='v2.1'",
                "readonly TE_COMMIT",
                "export AFTER='x'",
                "readonly AFTER",
            ]
        );
    }

    #[test]
    fn blank_aliased_entry_emits_nothing() {
        let config: FlatConfig = [("transformer_engine_repo_url", "")].into_iter().collect();
        assert!(statements(&config, &home_env()).is_empty());
    }

    #[test]
    fn alias_lookup() {
        assert_eq!(alias_for("transformer_engine_repo_url"), Some("TE_REPO_URL"));
        assert_eq!(alias_for("TRANSFORMER_ENGINE_COMMIT"), None);
        assert_eq!(alias_for("apex_commit"), None);
    }

    #[test]
    fn single_quotes_escaped() {
        let stmt = Statement::Export {
            name: "MSG".into(),
            value: "it's".into(),
        };
        assert_eq!(stmt.to_string(), r"export MSG='it'\''s'");
    }
}
