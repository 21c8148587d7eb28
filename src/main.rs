//! copylint CLI entry point.
//!
//! Parses arguments, initializes logging, and hands the run to the file
//! processor. Configuration errors abort with their exit code before any
//! file work begins; per-file errors are logged inside the processor and
//! never change the exit code.

use clap::Parser;
use copylint::cli::Cli;
use copylint::err_code;
use copylint::{logging, ExitCode, FileProcessor, RunConfig};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    std::process::exit(run(cli) as i32);
}

fn run(cli: Cli) -> ExitCode {
    let config = match RunConfig::from_cli(cli) {
        Ok(config) => config,
        Err(err) => {
            err_code!(err.msg_code(), "{err}");
            return err.exit_code();
        }
    };

    // One worker per core; tasks are whole files and never block each other.
    let _ = rayon::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get())
        .build_global();

    match FileProcessor::new(&config).process() {
        Ok(any_updated) => {
            if any_updated {
                log::debug!("One or more files were updated.");
            }
            ExitCode::Success
        }
        Err(err) => {
            err_code!(err.msg_code(), "{err}");
            err.exit_code()
        }
    }
}
