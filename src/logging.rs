//! Log setup for the binaries.
//!
//! Logs go to stderr; stdout is reserved for the statements the shell
//! evaluates. The filter comes from `BUILDENV_LOG` using the usual
//! `tracing_subscriber` directive syntax (`debug`, `buildenv=trace`, ...).

use tracing_subscriber::EnvFilter;

use crate::error::BuildEnvError;

pub const LOG_ENV_VAR: &str = "BUILDENV_LOG";
const DEFAULT_DIRECTIVE: &str = "buildenv=warn";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging() -> Result<(), BuildEnvError> {
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| BuildEnvError::LoggingInit(e.to_string()))
}
