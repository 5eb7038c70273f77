//! Core pipeline: turn a parsed document into the final flat config.
//!
//! Operates on pre-loaded data (`ResolveInput`) with no file I/O, making the
//! full pipeline testable with synthetic inputs. Steps:
//!
//! 1. Flatten the document into joined keys
//! 2. Apply the derivation rules in order
//! 3. Merge the home-directory paths on top (always overwriting)

use serde_yaml::Value;
use tracing::debug;

use crate::auto::AutoConfig;
use crate::derive::{self, HostInfo};
use crate::env::EnvLookup;
use crate::error::BuildEnvError;
use crate::flatten;
use crate::settings::LoaderSettings;
use crate::types::FlatConfig;

/// Everything needed to resolve a config.
pub struct ResolveInput<'a> {
    /// The parsed YAML document.
    pub document: Value,
    /// Source of `$HOME`.
    pub env: &'a dyn EnvLookup,
    /// Source of the processor count for `build_max_jobs`.
    pub host: &'a dyn HostInfo,
    pub settings: &'a LoaderSettings,
}

pub fn resolve(input: ResolveInput<'_>) -> Result<FlatConfig, BuildEnvError> {
    // 1: Flatten
    let mut config = flatten::flatten(&input.document, &input.settings.separator)?;
    debug!(entries = config.len(), "flattened config");

    // 2: Derived entries
    let applied = derive::derive(&mut config, input.host, &input.settings.index_base_url);
    debug!(?applied, "derivation complete");

    // 3: Computed paths win over anything configured
    AutoConfig::compute(&config, input.env, input.settings).merge_into(&mut config);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{BUILD_YAML, FixedHost, home_env, settings};
    use crate::types::FlatValue;

    fn resolve_yaml(yaml: &str) -> Result<FlatConfig, BuildEnvError> {
        let settings = settings();
        resolve(ResolveInput {
            document: serde_yaml::from_str(yaml).unwrap(),
            env: &home_env(),
            host: &FixedHost(Some(12)),
            settings: &settings.loader,
        })
    }

    #[test]
    fn full_build_config() {
        let config = resolve_yaml(BUILD_YAML).unwrap();
        assert_eq!(config.text("build_max_jobs").as_deref(), Some("12"));
        assert_eq!(config.text("pytorch_cuda_version").as_deref(), Some("12.8"));
        assert_eq!(config.text("pytorch_cuda_index").as_deref(), Some("cu128"));
        assert_eq!(
            config.text("pytorch_index_url").as_deref(),
            Some("https://download.pytorch.org/whl/cu128")
        );
        assert_eq!(config.text("cmake_cuda_architectures").as_deref(), Some("80;90"));
        assert_eq!(
            config.text("conda_env_full_path").as_deref(),
            Some("/home/ml/.conda/envs/te-build")
        );
        assert_eq!(config.get("apex_commit"), Some(&FlatValue::Null));
    }

    #[test]
    fn order_is_document_then_derived_then_auto() {
        let config = resolve_yaml("cuda:\n  toolkit_version: 12.4.1\nname: x\n").unwrap();
        let keys: Vec<&str> = config.keys().collect();
        assert_eq!(
            keys,
            vec![
                "cuda_toolkit_version",
                "name",
                "pytorch_cuda_version",
                "pytorch_cuda_index",
                "pytorch_index_url",
                "tools_dir",
                "conda_root_path",
                "conda_env_full_path",
            ]
        );
    }

    #[test]
    fn auto_paths_override_configured_ones() {
        let config = resolve_yaml("tools:\n  dir: /opt/tools\nconda:\n  root_path: /opt/conda\n").unwrap();
        assert_eq!(config.text("tools_dir").as_deref(), Some("/home/ml"));
        assert_eq!(
            config.text("conda_root_path").as_deref(),
            Some("/home/ml/miniconda3")
        );
    }

    #[test]
    fn boolean_leaves_keep_capitalized_spelling() {
        let config = resolve_yaml("feature:\n  enabled: true\n  legacy: yes\n").unwrap();
        assert_eq!(config.text("feature_enabled").as_deref(), Some("True"));
        // YAML 1.2: `yes` is a plain string, not a boolean.
        assert_eq!(config.text("feature_legacy").as_deref(), Some("yes"));
    }

    #[test]
    fn non_mapping_document_fails() {
        let err = resolve_yaml("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, BuildEnvError::ConfigFormat { .. }));
    }
}
