//! `buildenv-verify`: check the installed toolchain against the environment.

use std::process::ExitCode;

use buildenv::cli::{self, VerifyArgs};
use buildenv::{logging, ops};

fn main() -> ExitCode {
    let args: VerifyArgs = match cli::parse_from(std::env::args_os()) {
        Ok(args) => args,
        Err(code) => return ExitCode::from(code as u8),
    };
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: {e}");
    }

    let stdout = std::io::stdout();
    match ops::handle(&args.into_action(), &mut stdout.lock()) {
        Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
