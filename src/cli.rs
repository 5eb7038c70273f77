//! Clap adapter for the two binaries.
//!
//! Compiled only with the `clap` Cargo feature (on by default). The parsed
//! args are converted into an [`Action`](crate::Action) with `into_action()`;
//! everything after that goes through the clap-free [`ops::handle`](crate::ops::handle).

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

use crate::types::Action;

/// Print shell statements for a YAML build config.
///
/// Evaluate the output in bash: `eval "$(buildenv config.yaml)"`.
#[derive(Debug, Parser)]
#[command(name = "buildenv", version)]
pub struct LoadArgs {
    /// YAML config file to load.
    pub config: PathBuf,
}

impl LoadArgs {
    pub fn into_action(self) -> Action {
        Action::Load {
            config: self.config,
        }
    }
}

/// Check that the installed GPU toolchain matches the exported environment.
#[derive(Debug, Parser)]
#[command(name = "buildenv-verify", version)]
pub struct VerifyArgs {
    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Python interpreter to query (default from settings: python3).
    #[arg(long, value_name = "INTERPRETER")]
    pub python: Option<String>,
}

impl VerifyArgs {
    pub fn into_action(self) -> Action {
        Action::Verify {
            json: self.json,
            python: self.python,
        }
    }
}

/// Parse `args`, mapping clap's outcome onto this tool's exit codes.
///
/// `Err(code)` means the caller should exit with `code` after clap has
/// printed its message: 0 for `--help`/`--version`, 1 for any usage error.
pub fn parse_from<P, I, T>(args: I) -> Result<P, i32>
where
    P: Parser,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    P::try_parse_from(args).map_err(|e| {
        // Best effort: a closed stderr should not change the exit code.
        let _ = e.print();
        if e.use_stderr() { 1 } else { 0 }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(args: &[&str]) -> Result<LoadArgs, i32> {
        parse_from(args.iter().copied())
    }

    #[test]
    fn one_config_argument() {
        let action = load(&["buildenv", "config.yaml"]).unwrap().into_action();
        assert_eq!(
            action,
            Action::Load {
                config: PathBuf::from("config.yaml")
            }
        );
    }

    #[test]
    fn no_arguments_is_usage_error() {
        assert_eq!(load(&["buildenv"]).unwrap_err(), 1);
    }

    #[test]
    fn two_arguments_is_usage_error() {
        assert_eq!(load(&["buildenv", "a.yaml", "b.yaml"]).unwrap_err(), 1);
    }

    #[test]
    fn unknown_flag_is_usage_error() {
        assert_eq!(load(&["buildenv", "--verbose", "a.yaml"]).unwrap_err(), 1);
    }

    #[test]
    fn help_exits_zero() {
        assert_eq!(load(&["buildenv", "--help"]).unwrap_err(), 0);
    }

    #[test]
    fn verify_defaults() {
        let args: VerifyArgs = parse_from(["buildenv-verify"]).unwrap();
        assert_eq!(
            args.into_action(),
            Action::Verify {
                json: false,
                python: None
            }
        );
    }

    #[test]
    fn verify_with_flags() {
        let args: VerifyArgs =
            parse_from(["buildenv-verify", "--json", "--python", "/opt/conda/bin/python"]).unwrap();
        assert_eq!(
            args.into_action(),
            Action::Verify {
                json: true,
                python: Some("/opt/conda/bin/python".into())
            }
        );
    }

    #[test]
    fn verify_rejects_positional() {
        assert_eq!(parse_from::<VerifyArgs, _, _>(["buildenv-verify", "x"]).unwrap_err(), 1);
    }
}
