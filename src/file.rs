//! Reading the YAML config and locating the settings file.
//!
//! The config path is given explicitly, so there is no discovery: a missing
//! file is an error ([`BuildEnvError::ConfigNotFound`]), distinct from one that
//! exists but can't be read ([`BuildEnvError::IoError`]) or parsed
//! ([`BuildEnvError::ParseError`]).
//!
//! The settings file is optional. `$BUILDENV_SETTINGS` names it explicitly;
//! otherwise `settings.toml` in the platform config directory is used
//! (`~/.config/buildenv/` on Linux) if present.

use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::debug;

use crate::env::EnvLookup;
use crate::error::BuildEnvError;

pub const APP_NAME: &str = "buildenv";
pub const SETTINGS_FILE_NAME: &str = "settings.toml";
pub const SETTINGS_ENV_VAR: &str = "BUILDENV_SETTINGS";

/// Read and parse a YAML config document.
pub fn load_document(path: &Path) -> Result<Value, BuildEnvError> {
    if !path.exists() {
        return Err(BuildEnvError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|e| BuildEnvError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(path = %path.display(), bytes = content.len(), "read config");
    parse_document(&content, path)
}

/// Parse YAML text. `path` is only used in the error.
pub fn parse_document(content: &str, path: &Path) -> Result<Value, BuildEnvError> {
    serde_yaml::from_str(content).map_err(|e| BuildEnvError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Resolve the settings file to read, if any.
///
/// Returns `None` when neither `$BUILDENV_SETTINGS` is set nor the platform
/// config directory can be determined.
pub fn settings_path(env: &dyn EnvLookup) -> Option<PathBuf> {
    if let Some(explicit) = env.var(SETTINGS_ENV_VAR).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(explicit));
    }
    let proj = directories::ProjectDirs::from("", "", APP_NAME)?;
    Some(proj.config_dir().join(SETTINGS_FILE_NAME))
}
