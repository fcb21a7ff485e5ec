use std::process::ExitCode;

use clap::Parser;
use shelve::cli::{Cli, run};
use shelve::output::OutputFormatter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e);
            ExitCode::FAILURE
        }
    }
}
