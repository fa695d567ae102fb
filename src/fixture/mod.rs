//! Fixtures and the annotation parser.
//!
//! A fixture is a Wren script whose comments describe what compiling and
//! running it must produce. [`Fixture::parse`] turns the script text into a
//! [`Parsed`] value: either a runnable fixture with its expectations, or the
//! reason it must not be run at all.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{HarnessError, HarnessResult};

pub mod directive;

pub use directive::{classify, Directive};

/// Module name every fixture is compiled as.
pub const MODULE_NAME: &str = "test";

/// Which suite a fixture was discovered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureKind {
    Test,
    ApiTest,
    Example,
}

impl FixtureKind {
    /// Examples are checked for errors and exit status but not for output.
    pub fn is_output_insensitive(self) -> bool {
        matches!(self, FixtureKind::Example)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FixtureKind::Test => "test",
            FixtureKind::ApiTest => "api test",
            FixtureKind::Example => "example",
        }
    }
}

/// A line of program output the fixture expects, with the line of the
/// annotation that asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedOutput {
    pub text: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedRuntimeError {
    pub line: u32,
    pub message: String,
    pub handled: bool,
}

/// Result of parsing a fixture's annotations.
#[derive(Debug)]
pub enum Parsed {
    Runnable(Fixture),
    Skipped(String),
    NonTest,
}

#[derive(Debug, Clone)]
pub struct Fixture {
    pub path: PathBuf,
    pub kind: FixtureKind,
    pub output: Vec<ExpectedOutput>,
    pub compile_errors: BTreeSet<u32>,
    pub runtime_error: Option<ExpectedRuntimeError>,
    pub stdin: Option<Vec<u8>>,
    pub failures: Vec<String>,
    expectations: usize,
}

impl Fixture {
    fn new(path: PathBuf, kind: FixtureKind) -> Self {
        Self {
            path,
            kind,
            output: Vec::new(),
            compile_errors: BTreeSet::new(),
            runtime_error: None,
            stdin: None,
            failures: Vec::new(),
            expectations: 0,
        }
    }

    /// Reads a fixture from disk and parses it.
    ///
    /// Invalid UTF-8 in the file is replaced rather than rejected.
    pub fn load(path: &Path, kind: FixtureKind) -> HarnessResult<Parsed> {
        let bytes = fs::read(path).map_err(|source| HarnessError::ReadFixture {
            path: path.to_path_buf(),
            source,
        })?;
        let source = String::from_utf8_lossy(&bytes);
        Ok(Self::parse(path, kind, &source))
    }

    /// A fixture that could not be read. It carries a single failure and no
    /// expectations.
    pub fn unreadable(path: &Path, kind: FixtureKind, error: &HarnessError) -> Self {
        let mut fixture = Fixture::new(path.to_path_buf(), kind);
        fixture.fail(error.describe());
        fixture
    }

    /// Parses fixture annotations out of `source`.
    pub fn parse(path: &Path, kind: FixtureKind, source: &str) -> Parsed {
        let mut fixture = Fixture::new(path.to_path_buf(), kind);
        let mut input_lines = Vec::new();

        for (index, line) in split_lines(source).enumerate() {
            let line_num = index as u32 + 1;

            for directive in classify(line) {
                if directive.is_expectation() {
                    fixture.expectations += 1;
                }

                match directive {
                    Directive::Output(text) => fixture.output.push(ExpectedOutput {
                        text,
                        line: line_num,
                    }),
                    Directive::CompileError => {
                        fixture.compile_errors.insert(line_num);
                    }
                    Directive::CompileErrorLine(number) => {
                        fixture.compile_errors.insert(number);
                    }
                    Directive::RuntimeError { message, handled } => {
                        fixture.runtime_error = Some(ExpectedRuntimeError {
                            line: line_num,
                            message,
                            handled,
                        });
                    }
                    Directive::StdinLine(text) => input_lines.push(text),
                    Directive::Skip(reason) => return Parsed::Skipped(reason),
                    Directive::NonTest => return Parsed::NonTest,
                }
            }
        }

        if !input_lines.is_empty() {
            fixture.stdin = Some(input_lines.join("\n").into_bytes());
        }

        Parsed::Runnable(fixture)
    }

    pub fn expects_compile_errors(&self) -> bool {
        !self.compile_errors.is_empty()
    }

    /// Whether the program under test must exit with a nonzero status.
    pub fn expects_error_status(&self) -> bool {
        self.expects_compile_errors()
            || self.runtime_error.as_ref().is_some_and(|err| !err.handled)
    }

    pub fn expectation_count(&self) -> usize {
        self.expectations
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.failures.push(message.into());
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Splits on `\n` and `\r\n` only. A lone `\r` stays inside its line.
pub fn split_lines(source: &str) -> impl Iterator<Item = &str> {
    source
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Parsed {
        Fixture::parse(Path::new("test/sample.wren"), FixtureKind::Test, source)
    }

    fn runnable(source: &str) -> Fixture {
        match parse(source) {
            Parsed::Runnable(fixture) => fixture,
            other => panic!("expected a runnable fixture, got {:?}", other),
        }
    }

    #[test]
    fn split_lines_keeps_lone_carriage_returns() {
        let lines: Vec<&str> = split_lines("a\r\nb\rc\nd").collect();
        assert_eq!(lines, vec!["a", "b\rc", "d"]);
    }

    #[test]
    fn split_lines_strips_only_one_carriage_return() {
        let lines: Vec<&str> = split_lines("a\r\r\nb").collect();
        assert_eq!(lines, vec!["a\r", "b"]);
    }

    #[test]
    fn output_expectations_record_their_lines() {
        let fixture = runnable("System.print(1) // expect: 1\n\nSystem.print(2) // expect: 2\n");
        assert_eq!(
            fixture.output,
            vec![
                ExpectedOutput {
                    text: "1".to_string(),
                    line: 1
                },
                ExpectedOutput {
                    text: "2".to_string(),
                    line: 3
                },
            ]
        );
        assert_eq!(fixture.expectation_count(), 2);
        assert!(!fixture.expects_error_status());
    }

    #[test]
    fn crlf_fixture_numbers_lines_like_lf() {
        let fixture = runnable("x\r\ny // expect error\r\n");
        assert_eq!(fixture.compile_errors.iter().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn explicit_error_line_decouples_position() {
        let fixture = runnable("// expect error line 7\nclass {\n");
        assert!(fixture.compile_errors.contains(&7));
        assert!(fixture.expects_compile_errors());
        assert!(fixture.expects_error_status());
    }

    #[test]
    fn handled_runtime_error_does_not_require_error_status() {
        let fixture = runnable("\n\nFiber.abort(\"boom\") // expect handled runtime error: boom\n");
        assert_eq!(
            fixture.runtime_error,
            Some(ExpectedRuntimeError {
                line: 3,
                message: "boom".to_string(),
                handled: true,
            })
        );
        assert!(!fixture.expects_error_status());
    }

    #[test]
    fn unhandled_runtime_error_requires_error_status() {
        let fixture = runnable("Fiber.abort(\"boom\") // expect runtime error: boom\n");
        assert!(fixture.expects_error_status());
    }

    #[test]
    fn stdin_lines_are_joined_without_trailing_newline() {
        let fixture = runnable("// stdin: one\n// stdin: two\n");
        assert_eq!(fixture.stdin.as_deref(), Some(&b"one\ntwo"[..]));
    }

    #[test]
    fn no_stdin_directive_means_no_buffer() {
        assert!(runnable("System.print(1)\n").stdin.is_none());
    }

    #[test]
    fn skip_stops_parsing_with_reason() {
        match parse("// expect: 1\n// skip: slow\n// expect: 2\n") {
            Parsed::Skipped(reason) => assert_eq!(reason, "slow"),
            other => panic!("expected skip, got {:?}", other),
        }
    }

    #[test]
    fn nontest_stops_parsing() {
        assert!(matches!(parse("// nontest\n// expect: 1\n"), Parsed::NonTest));
    }

    #[test]
    fn both_error_kinds_are_kept_for_the_validator_to_reject() {
        let fixture = runnable("// expect error\n// expect runtime error: x\n");
        assert!(fixture.expects_compile_errors());
        assert!(fixture.runtime_error.is_some());
        assert_eq!(fixture.expectation_count(), 2);
    }

    #[test]
    fn examples_are_output_insensitive() {
        assert!(FixtureKind::Example.is_output_insensitive());
        assert!(!FixtureKind::Test.is_output_insensitive());
        assert!(!FixtureKind::ApiTest.is_output_insensitive());
    }
}
