//! Runner configuration resolved from the command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use termcolor::ColorChoice;

use crate::cli::args::HarnessArgs;
use crate::driver::DEFAULT_TIMEOUT;
use crate::errors::{HarnessError, HarnessResult};

/// Examples that wait for user input or take far too long. Provisional; more
/// can be added with `--exclude`.
pub const DEFAULT_EXAMPLE_EXCLUSIONS: &[&str] = &["animals", "guess_number", "skynet"];

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// The Wren checkout whose `test/` and `example/` trees are run.
    pub wren_dir: PathBuf,
    pub compiler: PathBuf,
    pub timeout: Duration,
    pub filter: Option<String>,
    pub show_passes: bool,
    pub static_output: bool,
    pub exclusions: Vec<String>,
    pub color: ColorChoice,
}

impl HarnessConfig {
    /// Configuration for the checkout at `root`, testing `build/wrencc<suffix>`.
    pub fn for_root(root: PathBuf, suffix: &str) -> Self {
        Self {
            wren_dir: root.join("lib").join("wren-main"),
            compiler: compiler_path(&root, suffix),
            timeout: DEFAULT_TIMEOUT,
            filter: None,
            show_passes: false,
            static_output: false,
            exclusions: DEFAULT_EXAMPLE_EXCLUSIONS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            color: detect_color(),
        }
    }

    pub fn from_args(args: HarnessArgs) -> Self {
        let mut config = Self::for_root(args.root, &args.suffix);
        config.timeout = Duration::from_secs(args.timeout);
        config.filter = args.suite;
        config.show_passes = args.show_passes;
        config.static_output = args.static_output;
        config.exclusions.extend(args.exclude);
        config
    }

    /// The compiler binary, or the fatal error reported before any fixture runs.
    pub fn locate_compiler(&self) -> HarnessResult<&Path> {
        if self.compiler.is_file() {
            Ok(&self.compiler)
        } else {
            Err(HarnessError::CompilerNotFound {
                path: self.compiler.clone(),
            })
        }
    }
}

/// `<root>/build/wrencc<suffix>`, with the platform's executable extension.
pub fn compiler_path(root: &Path, suffix: &str) -> PathBuf {
    root.join("build").join(format!(
        "wrencc{}{}",
        suffix,
        std::env::consts::EXE_SUFFIX
    ))
}

fn detect_color() -> ColorChoice {
    if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}
