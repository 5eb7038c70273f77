//! Smoke checks for an installed GPU toolchain.
//!
//! Each check compares something observable (the Python runtime, the
//! filesystem) against the variables the loader exported, and records a
//! [`CheckOutcome`]. A failing check never stops the run: [`Verifier::run`]
//! always executes every check and returns the whole [`Report`].
//!
//! When `torch.cuda.is_available()` is false, `cuda_available` fails and the
//! checks that need a device are recorded as skipped rather than failed.

use std::fmt;
use std::path::Path;
use std::process::Command;

use serde::Serialize;
use tracing::{debug, info};

use crate::env::EnvLookup;
use crate::error::ProbeError;
use crate::settings::VerifySettings;

const PYTHON_VERSION_SNIPPET: &str =
    "import sys; print(f'{sys.version_info.major}.{sys.version_info.minor}')";
const TORCH_CUDA_VERSION_SNIPPET: &str = "import torch; print(torch.version.cuda)";
const NUMPY_VERSION_SNIPPET: &str = "import numpy; print(numpy.__version__)";
/// Prints `True` or `False`, then a description of the runtime and devices.
const CUDA_AVAILABLE_SNIPPET: &str = "import torch
cuda = torch.cuda
if cuda.is_available():
    print(f'True PyTorch {torch.__version__}, {cuda.device_count()} GPU(s), '
          f'current device {cuda.current_device()}, device 0: {cuda.get_device_name(0)}')
else:
    print(f'False PyTorch {torch.__version__}')";
const DEVICE_CAPABILITY_SNIPPET: &str = "import torch
assert torch.cuda.device_count() >= 1, 'no GPU devices'
major, minor = torch.cuda.get_device_capability(0)
print(f'{major}.{minor}')";
const TENSOR_OPS_SNIPPET: &str = "import torch
a = torch.randn(16, 16, device='cuda')
b = torch.randn(16, 16, device='cuda')
print(tuple(torch.matmul(a, b).cpu().shape))";
const FLASH_ATTENTION_SNIPPET: &str = "import torch
from flash_attn.flash_attn_interface import flash_attn_func
q, k, v = (torch.randn(2, 4, 16, 64, dtype=torch.float16, device='cuda', requires_grad=True) for _ in range(3))
out = flash_attn_func(q, k, v, causal=True)
assert out.shape == q.shape, 'unexpected output shape'
assert out.dtype == torch.float16, 'unexpected output dtype'
assert not torch.isnan(out).any(), 'output contains NaN'
out.sum().backward()
assert q.grad is not None, 'no gradient for q'
print('ok')";

/// Runs Python code and returns its trimmed stdout.
pub trait Probe {
    fn run(&self, code: &str) -> Result<String, ProbeError>;
}

/// Runs snippets with `<interpreter> -c <code>`.
#[derive(Debug, Clone)]
pub struct PythonProbe {
    interpreter: String,
}

impl PythonProbe {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl Probe for PythonProbe {
    fn run(&self, code: &str) -> Result<String, ProbeError> {
        let output = Command::new(&self.interpreter)
            .arg("-c")
            .arg(code)
            .output()
            .map_err(|e| ProbeError::Spawn {
                interpreter: self.interpreter.clone(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // The last line of a traceback carries the exception.
            let last = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
            return Err(ProbeError::Failed {
                status: output.status.to_string(),
                stderr: last.trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub name: String,
    pub status: Status,
    pub detail: String,
}

impl CheckOutcome {
    fn passed(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, Status::Passed, detail)
    }

    fn failed(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, Status::Failed, detail)
    }

    fn skipped(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, Status::Skipped, detail)
    }

    fn new(name: impl Into<String>, status: Status, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            detail: detail.into(),
        }
    }
}

/// Every outcome of one run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub checks: Vec<CheckOutcome>,
}

impl Report {
    fn count(&self, status: Status) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    pub fn passed(&self) -> usize {
        self.count(Status::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(Status::Failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(Status::Skipped)
    }

    /// No check failed. Skipped checks don't count against success.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn get(&self, name: &str) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| c.name == name)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            match check.status {
                Status::Passed => writeln!(f, "✓ {}: {}", check.name, check.detail)?,
                Status::Failed => writeln!(f, "✗ {}: {}", check.name, check.detail)?,
                Status::Skipped => writeln!(f, "- {}: skipped ({})", check.name, check.detail)?,
            }
        }
        write!(
            f,
            "{} passed, {} failed, {} skipped",
            self.passed(),
            self.failed(),
            self.skipped()
        )
    }
}

/// Runs the checks against an environment and a Python runtime.
pub struct Verifier<'a> {
    env: &'a dyn EnvLookup,
    probe: &'a dyn Probe,
    settings: &'a VerifySettings,
}

impl<'a> Verifier<'a> {
    pub fn new(env: &'a dyn EnvLookup, probe: &'a dyn Probe, settings: &'a VerifySettings) -> Self {
        Self {
            env,
            probe,
            settings,
        }
    }

    pub fn run(&self) -> Report {
        let mut checks = vec![
            self.compare_env("python_version", "PYTHON_VERSION", PYTHON_VERSION_SNIPPET),
            self.compare_env(
                "pytorch_cuda_version",
                "PYTORCH_CUDA_VERSION",
                TORCH_CUDA_VERSION_SNIPPET,
            ),
            self.numpy_version(),
        ];

        let cuda = self.cuda_available();
        let gpu_ready = cuda.status == Status::Passed;
        checks.push(cuda);
        if gpu_ready {
            checks.extend(self.gpu_checks());
        } else {
            checks.extend(
                self.gpu_check_names()
                    .into_iter()
                    .map(|name| CheckOutcome::skipped(name, "CUDA is not available")),
            );
        }

        checks.push(self.cuda_home());
        checks.push(self.hpcx_library_path());

        for check in &checks {
            debug!(name = %check.name, status = ?check.status, detail = %check.detail, "check finished");
        }
        let report = Report { checks };
        info!(
            passed = report.passed(),
            failed = report.failed(),
            skipped = report.skipped(),
            "verification complete"
        );
        report
    }

    /// The exported variable must equal what the runtime reports.
    fn compare_env(&self, name: &str, var: &str, snippet: &str) -> CheckOutcome {
        let expected = self.env.var(var).unwrap_or_else(|| "N/A".to_string());
        self.compare(name, &expected, snippet)
    }

    fn compare(&self, name: &str, expected: &str, snippet: &str) -> CheckOutcome {
        match self.probe.run(snippet) {
            Ok(actual) if actual == expected => CheckOutcome::passed(name, actual),
            Ok(actual) => {
                CheckOutcome::failed(name, format!("expected {expected}, found {actual}"))
            }
            Err(e) => CheckOutcome::failed(name, e.to_string()),
        }
    }

    fn numpy_version(&self) -> CheckOutcome {
        match &self.settings.numpy_version {
            Some(expected) => self.compare("numpy_version", expected, NUMPY_VERSION_SNIPPET),
            None => CheckOutcome::skipped("numpy_version", "no expected version configured"),
        }
    }

    /// Passes with the PyTorch version and the visible devices as detail.
    fn cuda_available(&self) -> CheckOutcome {
        const NAME: &str = "cuda_available";
        let answer = match self.probe.run(CUDA_AVAILABLE_SNIPPET) {
            Ok(answer) => answer,
            Err(e) => return CheckOutcome::failed(NAME, e.to_string()),
        };
        let (available, runtime) = answer.split_once(' ').unwrap_or((answer.as_str(), ""));
        match available {
            "True" => CheckOutcome::passed(NAME, runtime),
            _ if runtime.is_empty() => CheckOutcome::failed(
                NAME,
                format!("torch.cuda.is_available() returned {available}"),
            ),
            _ => CheckOutcome::failed(NAME, format!("{runtime} cannot see a GPU")),
        }
    }

    fn wants_flash_attention(&self) -> bool {
        self.settings.libraries.iter().any(|l| l == "flash_attn")
    }

    fn gpu_check_names(&self) -> Vec<String> {
        let mut names = vec![
            "gpu_architecture".to_string(),
            "gpu_tensor_operations".to_string(),
        ];
        names.extend(self.settings.libraries.iter().map(|l| format!("import_{l}")));
        if self.wants_flash_attention() {
            names.push("flash_attention_forward_backward".to_string());
        }
        names
    }

    fn gpu_checks(&self) -> Vec<CheckOutcome> {
        let mut checks = vec![
            self.compare_env(
                "gpu_architecture",
                "TORCH_CUDA_ARCH_LIST",
                DEVICE_CAPABILITY_SNIPPET,
            ),
            self.compare("gpu_tensor_operations", "(16, 16)", TENSOR_OPS_SNIPPET),
        ];
        checks.extend(self.settings.libraries.iter().map(|lib| self.import_library(lib)));
        if self.wants_flash_attention() {
            checks.push(self.compare(
                "flash_attention_forward_backward",
                "ok",
                FLASH_ATTENTION_SNIPPET,
            ));
        }
        checks
    }

    fn import_library(&self, lib: &str) -> CheckOutcome {
        let name = format!("import_{lib}");
        if !is_module_path(lib) {
            return CheckOutcome::failed(name, format!("'{lib}' is not a module name"));
        }
        let snippet = format!("import {lib}; print(getattr({lib}, '__version__', 'N/A'))");
        match self.probe.run(&snippet) {
            Ok(version) => CheckOutcome::passed(name, format!("version {version}")),
            Err(e) => CheckOutcome::failed(name, e.to_string()),
        }
    }

    /// `CUDA_HOME` must be a directory containing `bin/nvcc`.
    fn cuda_home(&self) -> CheckOutcome {
        const NAME: &str = "cuda_home";
        let Some(cuda_home) = self.env.var("CUDA_HOME") else {
            return CheckOutcome::failed(NAME, "CUDA_HOME is not set");
        };
        let root = Path::new(&cuda_home);
        if !root.is_dir() {
            return CheckOutcome::failed(NAME, format!("{cuda_home} is not a directory"));
        }
        let nvcc = root.join("bin").join("nvcc");
        if !nvcc.is_file() {
            return CheckOutcome::failed(NAME, format!("nvcc not found at {}", nvcc.display()));
        }
        CheckOutcome::passed(NAME, nvcc.display().to_string())
    }

    /// `LD_LIBRARY_PATH` must include `$HPCX_HOME/ompi/lib`.
    fn hpcx_library_path(&self) -> CheckOutcome {
        const NAME: &str = "hpcx_library_path";
        let Some(hpcx_home) = self.env.var("HPCX_HOME") else {
            return CheckOutcome::failed(NAME, "HPCX_HOME is not set (module not loaded?)");
        };
        let expected = Path::new(&hpcx_home).join("ompi/lib");
        let expected = expected.display().to_string();
        let ld_path = self.env.var("LD_LIBRARY_PATH").unwrap_or_default();
        if ld_path.contains(&expected) {
            CheckOutcome::passed(NAME, expected)
        } else {
            CheckOutcome::failed(NAME, format!("LD_LIBRARY_PATH does not include {expected}"))
        }
    }
}

/// Dotted Python identifiers only, so the name is safe to splice into code.
fn is_module_path(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
