//! Shell environment for a GPU machine-learning build, from one YAML file.
//!
//! A build of PyTorch extensions (Apex, Transformer Engine, FlashAttention)
//! needs a dozen environment variables that agree with each other: the CUDA
//! toolkit version, the matching PyTorch wheel index, the compute
//! architectures in two spellings, conda paths. buildenv keeps the nested
//! YAML config as the single source and turns it into bash statements:
//!
//! ```sh
//! eval "$(buildenv config.yaml)"
//! buildenv-verify
//! ```
//!
//! # Pipeline
//!
//! ```text
//! YAML document
//!     │ flatten      cuda: {toolkit_version: 12.8.1} → cuda_toolkit_version
//!     ▼
//! FlatConfig (insertion ordered)
//!     │ derive       pytorch_cuda_version, pytorch_cuda_index, pytorch_index_url,
//!     │              cmake_cuda_architectures, build_max_jobs fallback
//!     │ auto merge   tools_dir, conda_root_path, conda_env_full_path (always win)
//!     ▼
//! emit           export NAME='value' / readonly NAME, plus TE_* aliases
//! ```
//!
//! Every stage after file reading is I/O free. The environment (for `$HOME`
//! and `$VAR` expansion) and the host (for the processor count) are injected
//! through [`EnvLookup`] and [`HostInfo`], so the whole pipeline runs in tests
//! against fixed inputs:
//!
//! ```ignore
//! let script = BuildEnv::builder()
//!     .config_path("config.yaml")
//!     .env(MapEnv::new().with("HOME", "/home/ml"))
//!     .render()?;
//! ```
//!
//! # Derivation rules
//!
//! Rules fire only when their input key is present and their output key is
//! not, so a value written in the YAML always beats a derived one and running
//! derivation twice changes nothing. See [`derive`] for the rules.
//!
//! # Flattening
//!
//! Nested keys are joined with `_`. Two different paths can join to the same
//! key (`a: {b: 1}` and `a_b: 2`); the later value wins at the earlier
//! position and a warning is logged.
//!
//! # Verification
//!
//! `buildenv-verify` compares the exported variables against what the Python
//! runtime reports (interpreter and CUDA versions, device capability,
//! extension imports) and against the filesystem (`CUDA_HOME`, HPC-X paths).
//! All checks run; the exit code is 1 if any failed. See [`verify`].
//!
//! # Settings
//!
//! The tool's own knobs (separator, index base URL, conda layout, libraries to
//! check) live in [`Settings`], loaded with confique from compiled defaults,
//! an optional `settings.toml` and `BUILDENV_*` variables.
//!
//! # Logging
//!
//! Library code logs through `tracing`. The binaries install a stderr
//! subscriber filtered by `BUILDENV_LOG`; stdout carries only the script.

pub mod derive;
pub mod error;
pub mod types;
pub mod verify;

mod auto;
mod builder;
#[cfg(feature = "clap")]
pub mod cli;
mod emit;
mod env;
mod file;
mod flatten;
pub mod logging;
pub mod ops;
mod resolve;
mod settings;

#[cfg(test)]
mod fixtures;

pub use auto::AutoConfig;
pub use builder::{BuildEnv, BuildEnvBuilder};
pub use derive::{HostInfo, SystemHost};
pub use emit::{ALIASES, Statement, alias_for, normalize_key, render, statements};
pub use env::{EnvLookup, MapEnv, ProcessEnv, expand_vars};
pub use error::{BuildEnvError, ProbeError};
pub use file::load_document;
pub use flatten::flatten;
pub use resolve::{ResolveInput, resolve};
pub use settings::{LoaderSettings, Settings, VerifySettings};
pub use types::{Action, FlatConfig, FlatValue};
