//! Paths computed from the home directory, merged over the flattened config.

use tracing::debug;

use crate::env::EnvLookup;
use crate::settings::LoaderSettings;
use crate::types::{FlatConfig, FlatValue};

pub const TOOLS_DIR: &str = "tools_dir";
pub const CONDA_ROOT_PATH: &str = "conda_root_path";
pub const CONDA_ENV_FULL_PATH: &str = "conda_env_full_path";
pub const CONDA_ENV_NAME: &str = "conda_env_name";

/// Used when no home directory can be found at all.
const UNRESOLVED_HOME: &str = "$HOME";

#[derive(Debug, Clone, PartialEq)]
pub struct AutoConfig {
    pub tools_dir: String,
    pub conda_root_path: String,
    pub conda_env_full_path: String,
}

impl AutoConfig {
    /// Compute the paths from the home directory and `conda_env_name`.
    ///
    /// A missing or null `conda_env_name` falls back to the configured default
    /// environment name. An empty name is kept and yields the envs directory
    /// itself with a trailing slash.
    pub fn compute(config: &FlatConfig, env: &dyn EnvLookup, settings: &LoaderSettings) -> Self {
        let home = env
            .home_dir()
            .unwrap_or_else(|| UNRESOLVED_HOME.to_string());
        let env_name = config
            .get(CONDA_ENV_NAME)
            .filter(|v| **v != FlatValue::Null)
            .map_or_else(|| settings.default_env_name.clone(), |v| v.to_text());

        Self {
            conda_root_path: format!("{home}/{}", settings.conda_root_dir),
            conda_env_full_path: format!("{home}/{}/{env_name}", settings.conda_envs_dir),
            tools_dir: home,
        }
    }

    /// Write the three paths into `config`, replacing whatever was there.
    pub fn merge_into(self, config: &mut FlatConfig) {
        for (key, value) in [
            (TOOLS_DIR, self.tools_dir),
            (CONDA_ROOT_PATH, self.conda_root_path),
            (CONDA_ENV_FULL_PATH, self.conda_env_full_path),
        ] {
            if let Some(previous) = config.insert(key, value) {
                debug!(key, previous = %previous, "computed path replaces configured value");
            }
        }
    }
}
