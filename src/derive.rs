//! Computed entries derived from existing ones.
//!
//! Each rule inspects the [`FlatConfig`] and returns `Some(entries)` when its
//! inputs are present and its outputs are not, or `None` when it does not
//! apply. [`derive`] runs the rules in a fixed order, applying each result
//! before the next rule looks, so later rules see earlier outputs.

use tracing::debug;

use crate::types::{FlatConfig, FlatValue};

pub const BUILD_MAX_JOBS: &str = "build_max_jobs";
pub const CUDA_TOOLKIT_VERSION: &str = "cuda_toolkit_version";
pub const PYTORCH_CUDA_VERSION: &str = "pytorch_cuda_version";
pub const PYTORCH_CUDA_INDEX: &str = "pytorch_cuda_index";
pub const PYTORCH_INDEX_URL: &str = "pytorch_index_url";
pub const TORCH_CUDA_ARCH_LIST: &str = "torch_cuda_arch_list";
pub const CMAKE_CUDA_ARCHITECTURES: &str = "cmake_cuda_architectures";

/// Entries a rule wants to set.
pub type Derived = Vec<(&'static str, FlatValue)>;

/// Facts about the machine the loader runs on.
pub trait HostInfo {
    /// Number of processing units available, or `None` if it can't be determined.
    fn processor_count(&self) -> Option<usize>;
}

/// Queries the running system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl HostInfo for SystemHost {
    fn processor_count(&self) -> Option<usize> {
        match std::thread::available_parallelism() {
            Ok(n) => Some(n.get()),
            Err(e) => {
                debug!(error = %e, "processor count unavailable");
                None
            }
        }
    }
}

/// Run every rule in order, returning the keys that were set.
pub fn derive(config: &mut FlatConfig, host: &dyn HostInfo, index_base_url: &str) -> Vec<&'static str> {
    let mut applied = Vec::new();

    let derived = build_jobs_fallback(config, host);
    apply(config, derived, &mut applied);
    let derived = cuda_framework_version(config);
    apply(config, derived, &mut applied);
    let derived = package_index_url(config, index_base_url);
    apply(config, derived, &mut applied);
    let derived = cmake_architectures(config);
    apply(config, derived, &mut applied);

    applied
}

fn apply(config: &mut FlatConfig, derived: Option<Derived>, applied: &mut Vec<&'static str>) {
    let Some(entries) = derived else {
        return;
    };
    for (key, value) in entries {
        debug!(key, value = %value, "derived");
        config.insert(key, value);
        applied.push(key);
    }
}

/// A present but falsy `build_max_jobs` becomes the host's processor count,
/// or `"1"` when that can't be determined.
pub fn build_jobs_fallback(config: &FlatConfig, host: &dyn HostInfo) -> Option<Derived> {
    if !config.get(BUILD_MAX_JOBS)?.is_falsy() {
        return None;
    }
    let jobs = host
        .processor_count()
        .map_or_else(|| "1".to_string(), |n| n.to_string());
    Some(vec![(BUILD_MAX_JOBS, jobs.into())])
}

/// `cuda_toolkit_version = "12.8.1"` yields `pytorch_cuda_version = "12.8"`
/// and `pytorch_cuda_index = "cu128"`. Versions with fewer than two
/// dot-separated parts derive nothing.
pub fn cuda_framework_version(config: &FlatConfig) -> Option<Derived> {
    if config.contains_key(PYTORCH_CUDA_VERSION) {
        return None;
    }
    let toolkit = config.text(CUDA_TOOLKIT_VERSION)?;
    let mut parts = toolkit.split('.');
    let (major, minor) = (parts.next()?, parts.next()?);
    Some(vec![
        (PYTORCH_CUDA_VERSION, format!("{major}.{minor}").into()),
        (PYTORCH_CUDA_INDEX, format!("cu{major}{minor}").into()),
    ])
}

/// `pytorch_cuda_index = "cu128"` yields `pytorch_index_url = "<base>/cu128"`.
pub fn package_index_url(config: &FlatConfig, base: &str) -> Option<Derived> {
    if config.contains_key(PYTORCH_INDEX_URL) {
        return None;
    }
    let index = config.text(PYTORCH_CUDA_INDEX)?;
    let base = base.trim_end_matches('/');
    Some(vec![(PYTORCH_INDEX_URL, format!("{base}/{index}").into())])
}

/// `torch_cuda_arch_list = "8.0;9.0"` yields `cmake_cuda_architectures = "80;90"`.
pub fn cmake_architectures(config: &FlatConfig) -> Option<Derived> {
    if config.contains_key(CMAKE_CUDA_ARCHITECTURES) {
        return None;
    }
    let arch_list = config.text(TORCH_CUDA_ARCH_LIST)?;
    Some(vec![(CMAKE_CUDA_ARCHITECTURES, arch_list.replace('.', "").into())])
}
