//! Checking a fixture's observed behaviour against its expectations.
//!
//! [`validate`] is a pure function: it reads the fixture's expectations and
//! one [`ExecutionResult`], and returns every mismatch as a human readable
//! failure line, in the order they were found. An empty list means the
//! fixture passed.

use std::collections::BTreeSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::driver::ExecutionResult;
use crate::fixture::{ExpectedOutput, ExpectedRuntimeError, Fixture, MODULE_NAME};

/// A compile error reported by the compiler, possibly from an imported module.
static ERROR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.* line (\d+)\] Error").unwrap());
/// A stack frame; group 1 is the frame's module or path, group 2 its line.
static STACK_TRACE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(?:\./)?(.*) line (\d+)\] in").unwrap());

pub const BOTH_ERROR_KINDS: &str = "Test error: Cannot expect both compile and runtime errors.";
pub const DECODE_FAILURE: &str = "Error decoding output.";

pub fn validate(fixture: &Fixture, result: &ExecutionResult) -> Vec<String> {
    let mut failures = Vec::new();

    if fixture.expects_compile_errors() && fixture.runtime_error.is_some() {
        failures.push(BOTH_ERROR_KINDS.to_string());
        return failures;
    }

    let decoded = result.decode();
    if !decoded.valid_utf8 {
        failures.push(DECODE_FAILURE.to_string());
    }

    let error_lines: Vec<&str> = decoded.stderr.split('\n').collect();

    match &fixture.runtime_error {
        Some(expected) => {
            check_runtime_error(expected, &fixture.path, &error_lines, &mut failures)
        }
        None => check_compile_errors(&fixture.compile_errors, &error_lines, &mut failures),
    }

    check_exit_code(
        fixture.expects_error_status(),
        result.exit_code,
        &error_lines,
        &mut failures,
    );

    if !fixture.kind.is_output_insensitive() {
        check_output(&fixture.output, &decoded.stdout, &mut failures);
    }

    failures
}

fn check_runtime_error(
    expected: &ExpectedRuntimeError,
    fixture_path: &Path,
    error_lines: &[&str],
    failures: &mut Vec<String>,
) {
    if error_lines.len() < 2 {
        failures.push(format!(
            "Expected runtime error \"{}\" and got none.",
            expected.message
        ));
        return;
    }

    // Compile errors from imported modules can precede the runtime error.
    let first = error_lines
        .iter()
        .position(|line| !ERROR_PATTERN.is_match(line))
        .unwrap_or(error_lines.len());
    let actual = error_lines.get(first).copied().unwrap_or_default();

    if actual != expected.message {
        failures.push(format!(
            "Expected runtime error \"{}\" and got:",
            expected.message
        ));
        failures.push(actual.to_string());
    }

    let stack_lines = error_lines.get(first + 1..).unwrap_or_default();
    match stack_lines
        .iter()
        .find_map(|line| user_frame_line(line, fixture_path))
    {
        None => {
            failures.push("Expected stack trace and got:".to_string());
            failures.extend(stack_lines.iter().map(|line| line.to_string()));
        }
        Some(line) if line != expected.line => failures.push(format!(
            "Expected runtime error on line {} but was on line {}.",
            expected.line, line
        )),
        Some(_) => {}
    }
}

/// Line number of a stack frame that points into the fixture itself. Frames
/// from built-in modules yield `None`.
fn user_frame_line(line: &str, fixture_path: &Path) -> Option<u32> {
    let caps = STACK_TRACE_PATTERN.captures(line)?;
    let location = &caps[1];
    let in_fixture = location.starts_with("test/")
        || location == MODULE_NAME
        || (!location.is_empty() && fixture_path.ends_with(Path::new(location)));
    if !in_fixture {
        return None;
    }
    caps[2].parse().ok()
}

fn check_compile_errors(expected: &BTreeSet<u32>, error_lines: &[&str], failures: &mut Vec<String>) {
    let mut found = BTreeSet::new();

    for line in error_lines {
        if let Some(caps) = ERROR_PATTERN.captures(line) {
            match caps[1].parse::<u32>() {
                Ok(number) if expected.contains(&number) => {
                    found.insert(number);
                }
                _ => {
                    failures.push("Unexpected error:".to_string());
                    failures.push(line.to_string());
                }
            }
        } else if !line.trim().is_empty() {
            failures.push("Unexpected output on stderr:".to_string());
            failures.push(line.to_string());
        }
    }

    for line in expected.difference(&found) {
        failures.push(format!("Missing expected error on line {}.", line));
    }
}

fn check_exit_code(
    error_expected: bool,
    exit_code: i32,
    error_lines: &[&str],
    failures: &mut Vec<String>,
) {
    let had_error = exit_code != 0;
    if had_error == error_expected {
        return;
    }

    failures.push(format!(
        "Expecting non-zero return code? {}. Got {}. Stderr:",
        error_expected, exit_code
    ));
    failures.extend(error_lines.iter().map(|line| line.to_string()));
}

fn check_output(expected: &[ExpectedOutput], stdout: &str, failures: &mut Vec<String>) {
    let mut actual: Vec<&str> = stdout.split('\n').collect();
    // The final newline leaves one empty element behind.
    if actual.last() == Some(&"") {
        actual.pop();
    }

    for (index, line) in actual.iter().enumerate() {
        match expected.get(index) {
            None => failures.push(format!("Got output \"{}\" when none was expected.", line)),
            Some(want) if want.text != *line => failures.push(format!(
                "Expected output \"{}\" on line {} and got \"{}\".",
                want.text, want.line, line
            )),
            Some(_) => {}
        }
    }

    for want in expected.iter().skip(actual.len()) {
        failures.push(format!(
            "Missing expected output \"{}\" on line {}.",
            want.text, want.line
        ));
    }
}
