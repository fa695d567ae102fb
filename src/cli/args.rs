//! Command-line arguments for the conformance runner. Resolved into a
//! [`HarnessConfig`](crate::config::HarnessConfig) before anything runs.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "wrencc-test",
    version,
    about = "Compiles and runs the Wren test suite with wrencc and checks every expectation."
)]
pub struct HarnessArgs {
    /// Only run fixtures whose path below lib/wren-main starts with this.
    pub suite: Option<String>,

    /// Suffix of the compiler binary to test, e.g. `_d` for build/wrencc_d.
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub suffix: String,

    /// List the tests that pass.
    #[arg(short = 'p', long)]
    pub show_passes: bool,

    /// Don't overwrite the status line; print one line per update.
    #[arg(short = 's', long)]
    pub static_output: bool,

    /// The compiler checkout containing build/ and lib/wren-main/.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Seconds a compiled fixture may run before it is killed.
    #[arg(long, default_value_t = 5)]
    pub timeout: u64,

    /// Skip examples whose path contains this text. Repeatable.
    #[arg(long = "exclude", value_name = "SUBSTRING")]
    pub exclude: Vec<String>,
}
