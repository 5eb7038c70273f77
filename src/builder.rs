use std::io::Write;
use std::path::PathBuf;

use tracing::info;

use crate::derive::{HostInfo, SystemHost};
use crate::emit;
use crate::env::{EnvLookup, ProcessEnv};
use crate::error::BuildEnvError;
use crate::file;
use crate::resolve::{self, ResolveInput};
use crate::settings::Settings;
use crate::types::FlatConfig;

/// Entry point for loading a build config.
pub struct BuildEnv;

impl BuildEnv {
    pub fn builder() -> BuildEnvBuilder {
        BuildEnvBuilder::new()
    }
}

/// Builder wiring a config file to the environment and host it is resolved
/// against.
///
/// Defaults read the real process environment and query the running system;
/// tests swap in [`MapEnv`](crate::MapEnv) and a fixed [`HostInfo`].
pub struct BuildEnvBuilder {
    config_path: Option<PathBuf>,
    env: Box<dyn EnvLookup>,
    host: Box<dyn HostInfo>,
    settings: Option<Settings>,
}

impl BuildEnvBuilder {
    fn new() -> Self {
        Self {
            config_path: None,
            env: Box::new(ProcessEnv),
            host: Box::new(SystemHost),
            settings: None,
        }
    }

    /// The YAML file to load. Required.
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Replace the environment used for `$HOME` and `$VAR` expansion.
    ///
    /// Settings are still loaded from the process environment unless
    /// [`settings`](Self::settings) is also given.
    pub fn env(mut self, env: impl EnvLookup + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Replace the processor-count source.
    pub fn host(mut self, host: impl HostInfo + 'static) -> Self {
        self.host = Box::new(host);
        self
    }

    /// Use these settings instead of loading them from file and environment.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    fn effective_settings(&self) -> Result<Settings, BuildEnvError> {
        match &self.settings {
            Some(settings) => Ok(settings.clone()),
            None => Settings::load(self.env.as_ref()),
        }
    }

    fn effective_config_path(&self) -> Result<&PathBuf, BuildEnvError> {
        self.config_path
            .as_ref()
            .ok_or(BuildEnvError::ConfigPathRequired)
    }

    /// Read, flatten, derive and merge.
    pub fn load(&self) -> Result<FlatConfig, BuildEnvError> {
        let path = self.effective_config_path()?;
        let settings = self.effective_settings()?;
        let document = file::load_document(path)?;

        let config = resolve::resolve(ResolveInput {
            document,
            env: self.env.as_ref(),
            host: self.host.as_ref(),
            settings: &settings.loader,
        })?;
        info!(path = %path.display(), entries = config.len(), "config resolved");
        Ok(config)
    }

    /// The shell script for the loaded config.
    pub fn render(&self) -> Result<String, BuildEnvError> {
        let config = self.load()?;
        Ok(emit::render(&config, self.env.as_ref()))
    }

    /// Render and write the script to `out`.
    pub fn write_to(&self, out: &mut dyn Write) -> Result<(), BuildEnvError> {
        let script = self.render()?;
        out.write_all(script.as_bytes())
            .and_then(|()| out.flush())
            .map_err(BuildEnvError::Output)
    }
}
