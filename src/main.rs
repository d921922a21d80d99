//! dupestream - Streaming Duplicate File Finder
//!
//! Entry point for the dupestream CLI.

use clap::Parser;
use dupestream::{
    cli::Cli,
    error::{ExitCode, StructuredError},
};

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    match dupestream::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = ExitCode::GeneralError;

            if json_errors {
                let structured = StructuredError::new(&err, exit_code);
                match serde_json::to_string_pretty(&structured) {
                    Ok(json) => eprintln!("{json}"),
                    Err(_) => eprintln!("[{}] Error: {err}", exit_code.code_prefix()),
                }
            } else {
                eprintln!("[{}] Error: {err}", exit_code.code_prefix());
            }

            std::process::exit(exit_code.as_i32());
        }
    }
}
