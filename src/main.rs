//! Main entry point for the `hookpin` CLI.

use console::style;
use hookpin::cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            if e.is_user_error() {
                eprintln!("{} {e}", style("✗").red());
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        },
    }
}
