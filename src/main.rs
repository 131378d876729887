mod cli;
mod terminal_view;

use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = cli::Cli::parse();
    let config = runpad::config::load_config();

    // MUST stay alive until exit so buffered log lines reach the file
    let _guard = runpad::logging::init(&config.log_dir());

    match cli::run(args, config) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
