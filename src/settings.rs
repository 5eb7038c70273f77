//! The tool's own settings, as opposed to the build config it loads.
//!
//! Compiled defaults reproduce the stock behavior. Any field can be changed in
//! a TOML file (`$BUILDENV_SETTINGS`, or `settings.toml` in the platform config
//! directory) and some through `BUILDENV_*` environment variables, which win
//! over the file.

use confique::Config;
use tracing::debug;

use crate::env::EnvLookup;
use crate::error::BuildEnvError;
use crate::file;

#[derive(Config, Debug, Clone)]
pub struct Settings {
    /// How the YAML config is turned into shell variables.
    #[config(nested)]
    pub loader: LoaderSettings,

    /// What `buildenv-verify` checks.
    #[config(nested)]
    pub verify: VerifySettings,
}

#[derive(Config, Debug, Clone)]
pub struct LoaderSettings {
    /// Joins nested keys when flattening.
    #[config(default = "_", env = "BUILDENV_SEPARATOR")]
    pub separator: String,

    /// Package index the CUDA index tag (e.g. `cu128`) is appended to.
    #[config(
        default = "https://download.pytorch.org/whl",
        env = "BUILDENV_INDEX_BASE_URL"
    )]
    pub index_base_url: String,

    /// Conda installation directory, relative to the home directory.
    #[config(default = "miniconda3")]
    pub conda_root_dir: String,

    /// Directory holding conda environments, relative to the home directory.
    #[config(default = ".conda/envs")]
    pub conda_envs_dir: String,

    /// Environment name used when the config has no `conda.env_name`.
    #[config(default = "default_env")]
    pub default_env_name: String,
}

#[derive(Config, Debug, Clone)]
pub struct VerifySettings {
    /// Interpreter used to query the Python runtime.
    #[config(default = "python3", env = "BUILDENV_PYTHON")]
    pub python: String,

    /// Extension libraries that must import.
    #[config(default = ["apex", "transformer_engine", "flash_attn"])]
    pub libraries: Vec<String>,

    /// Expected numpy version. The check is skipped when unset.
    #[config(env = "BUILDENV_NUMPY_VERSION")]
    pub numpy_version: Option<String>,
}

impl Settings {
    /// Compiled defaults only.
    pub fn defaults() -> Result<Self, BuildEnvError> {
        Ok(Self::builder().load()?)
    }

    /// Defaults, overlaid by the settings file if one exists, overlaid by
    /// `BUILDENV_*` environment variables.
    ///
    /// `env` only locates the settings file. The `BUILDENV_*` overrides are
    /// read by confique from the process environment, so a [`MapEnv`] does
    /// not isolate them; pass explicit settings to the builder for that.
    ///
    /// [`MapEnv`]: crate::MapEnv
    pub fn load(env: &dyn EnvLookup) -> Result<Self, BuildEnvError> {
        let mut builder = Self::builder().env();
        if let Some(path) = file::settings_path(env) {
            debug!(path = %path.display(), "reading settings file");
            builder = builder.file(path);
        }
        Ok(builder.load()?)
    }
}
