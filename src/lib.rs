//! Conformance runner for the wrencc Wren compiler.
//!
//! Fixtures are Wren scripts annotated with `// expect` comments. Each one is
//! compiled with the candidate compiler, the resulting program is run under a
//! timeout, and its output, diagnostics and exit status are checked against
//! the annotations.

pub use crate::errors::{HarnessError, HarnessResult};

pub mod cli;
pub mod config;
pub mod discovery;
pub mod driver;
pub mod errors;
pub mod fixture;
pub mod logging;
pub mod runner;
pub mod summary;
pub mod validate;
