//! Engine-level errors for the conformance runner.
//!
//! Everything that goes wrong with a single fixture is recorded as a failure
//! string on that fixture and never surfaces here. `HarnessError` covers the
//! failures of the runner itself: a missing compiler binary, unreadable
//! fixtures, directory walks and subprocess plumbing. Only the first of these is
//! fatal to a whole run; the others are turned into per-fixture failures by the
//! caller.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum HarnessError {
    #[error("The binary file 'wrencc' was not found, expected it to be at {}", path.display())]
    #[diagnostic(
        code(wrencc_test::config::compiler_not_found),
        help("In order to run the tests, you need to build the compiler first!")
    )]
    CompilerNotFound { path: PathBuf },

    #[error("Failed to read fixture '{}'", path.display())]
    #[diagnostic(code(wrencc_test::fixture::read))]
    ReadFixture {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to walk directory '{}'", root.display())]
    #[diagnostic(code(wrencc_test::discovery::walk))]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to spawn '{}'", program.display())]
    #[diagnostic(code(wrencc_test::driver::spawn))]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while {action}")]
    #[diagnostic(code(wrencc_test::driver::io))]
    Io {
        action: &'static str,
        #[source]
        source: io::Error,
    },
}

impl HarnessError {
    pub(crate) fn io(action: &'static str, source: io::Error) -> Self {
        Self::Io { action, source }
    }

    /// True when the error must abort the whole run rather than one fixture.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CompilerNotFound { .. })
    }

    /// One-line rendering including the underlying cause, for fixture failures.
    pub fn describe(&self) -> String {
        match std::error::Error::source(self) {
            Some(source) => format!("{}: {}", self, source),
            None => self.to_string(),
        }
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;

/// Renders an error with full miette diagnostics on stderr.
pub fn print_error(error: HarnessError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}
