use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildEnvError {
    #[error("Config file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to load YAML file {}: {source}", path.display())]
    ParseError {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config document: {reason}")]
    ConfigFormat { reason: String },

    #[error("Settings error: {0}")]
    SettingsError(#[from] confique::Error),

    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to write output: {0}")]
    Output(#[source] std::io::Error),

    #[error("No config file given; call .config_path() on the builder")]
    ConfigPathRequired,
}

/// Failure of a single query against the Python runtime.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("could not start {interpreter}: {source}")]
    Spawn {
        interpreter: String,
        source: std::io::Error,
    },

    #[error("probe exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}
