//! Runs an [`Action`] against the real environment.
//!
//! This is the single place the binaries call into; it picks the process
//! environment, the running host and a subprocess-backed Python probe.

use std::io::Write;

use crate::builder::BuildEnv;
use crate::env::ProcessEnv;
use crate::error::BuildEnvError;
use crate::settings::Settings;
use crate::types::Action;
use crate::verify::{PythonProbe, Report, Verifier};

/// What an action produced, for choosing the exit code.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Shell statements were written.
    Exported,
    /// Checks ran; see the report for failures.
    Verified(Report),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        match self {
            Outcome::Exported => true,
            Outcome::Verified(report) => report.is_success(),
        }
    }
}

/// Perform `action`, writing its output to `out`.
pub fn handle(action: &Action, out: &mut dyn Write) -> Result<Outcome, BuildEnvError> {
    match action {
        Action::Load { config } => {
            BuildEnv::builder().config_path(config).write_to(out)?;
            Ok(Outcome::Exported)
        }
        Action::Verify { json, python } => {
            let env = ProcessEnv;
            let mut settings = Settings::load(&env)?;
            if let Some(interpreter) = python {
                settings.verify.python = interpreter.clone();
            }
            let probe = PythonProbe::new(settings.verify.python.as_str());
            let report = Verifier::new(&env, &probe, &settings.verify).run();

            let text = if *json {
                report
                    .to_json()
                    .map_err(|e| BuildEnvError::Output(std::io::Error::other(e)))?
            } else {
                report.to_string()
            };
            writeln!(out, "{text}").map_err(BuildEnvError::Output)?;
            Ok(Outcome::Verified(report))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::CheckOutcome;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn load_writes_statements() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "python:\n  version: '3.10'\n").unwrap();

        let mut out = Vec::new();
        let outcome = handle(&Action::Load { config: path }, &mut out).unwrap();
        assert_eq!(outcome, Outcome::Exported);

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("export PYTHON_VERSION='3.10'\nreadonly PYTHON_VERSION\n"));
        assert!(text.contains("export TOOLS_DIR="));
    }

    #[test]
    fn load_missing_file_errors() {
        let mut out = Vec::new();
        let err = handle(
            &Action::Load {
                config: "/nonexistent/config.yaml".into(),
            },
            &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, BuildEnvError::ConfigNotFound { .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn verify_with_missing_interpreter_fails_checks() {
        let mut out = Vec::new();
        let outcome = handle(
            &Action::Verify {
                json: true,
                python: Some("/nonexistent/python3".into()),
            },
            &mut out,
        )
        .unwrap();
        assert!(!outcome.is_success());
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["checks"][0]["name"], "python_version");
        assert_eq!(json["checks"][0]["status"], "failed");
    }

    #[test]
    fn verified_outcome_follows_report() {
        let report = Report {
            checks: vec![CheckOutcome {
                name: "cuda_home".into(),
                status: crate::verify::Status::Skipped,
                detail: String::new(),
            }],
        };
        assert!(Outcome::Verified(report).is_success());
    }
}
