//! The wrencc-test command-line interface.
//!
//! Parses arguments, resolves the configuration and hands off to the runner.

use std::process;

use clap::Parser;

use crate::cli::args::HarnessArgs;
use crate::config::HarnessConfig;
use crate::errors::print_error;
use crate::logging::init_tracing;
use crate::runner;

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    init_tracing();
    let args = HarnessArgs::parse();
    let config = HarnessConfig::from_args(args);

    match runner::run_suite(&config) {
        Ok(summary) => process::exit(summary.exit_code()),
        Err(e) => {
            print_error(e);
            process::exit(1);
        }
    }
}
