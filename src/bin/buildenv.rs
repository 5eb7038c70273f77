//! `buildenv <config.yaml>`: print bash statements for a build config.

use std::process::ExitCode;

use buildenv::cli::{self, LoadArgs};
use buildenv::{logging, ops};

fn main() -> ExitCode {
    let args: LoadArgs = match cli::parse_from(std::env::args_os()) {
        Ok(args) => args,
        Err(code) => return ExitCode::from(code as u8),
    };
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: {e}");
    }

    let stdout = std::io::stdout();
    match ops::handle(&args.into_action(), &mut stdout.lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
