//! Line classification for fixture annotations.
//!
//! Every physical line of a fixture is classified exactly once into the
//! directives it carries. A directive is recognised by its marker substring
//! anywhere on the line, so `foo() // expect: 1` and a bare `// expect: 1` are
//! equivalent.

use once_cell::sync::Lazy;
use regex::Regex;

static EXPECT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"// expect: ?(.*)").unwrap());
static EXPECT_ERROR_LINE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"// expect error line (\d+)").unwrap());
static EXPECT_RUNTIME_ERROR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"// expect (handled )?runtime error: (.+)").unwrap());
static STDIN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"// stdin: (.*)").unwrap());
static SKIP_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"// skip: (.*)").unwrap());

const EXPECT_ERROR_MARKER: &str = "// expect error";
const NONTEST_MARKER: &str = "// nontest";

/// One annotation found on a fixture line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `// expect: <text>`
    Output(String),
    /// `// expect error`, asserting a compile error on the annotated line.
    CompileError,
    /// `// expect error line <N>`
    CompileErrorLine(u32),
    /// `// expect [handled ]runtime error: <message>`
    RuntimeError { message: String, handled: bool },
    /// `// stdin: <text>`
    StdinLine(String),
    /// `// skip: <reason>`
    Skip(String),
    /// `// nontest`
    NonTest,
}

impl Directive {
    /// Whether this directive adds to the expectation count.
    pub fn is_expectation(&self) -> bool {
        matches!(
            self,
            Directive::Output(_)
                | Directive::CompileError
                | Directive::CompileErrorLine(_)
                | Directive::RuntimeError { .. }
        )
    }
}

/// Classifies a single line into every directive it carries.
///
/// The returned order is fixed: output, compile error, compile error with an
/// explicit line, runtime error, stdin, skip, nontest. Callers rely on it to
/// apply the other directives of a line before a `skip` on that same line.
pub fn classify(line: &str) -> Vec<Directive> {
    let mut directives = Vec::new();
    if line.is_empty() {
        return directives;
    }

    if let Some(caps) = EXPECT_PATTERN.captures(line) {
        directives.push(Directive::Output(caps[1].to_string()));
    }

    if expects_bare_compile_error(line) {
        directives.push(Directive::CompileError);
    }

    if let Some(caps) = EXPECT_ERROR_LINE_PATTERN.captures(line) {
        // Out-of-range numbers can never match a diagnostic, so they are dropped.
        if let Ok(number) = caps[1].parse::<u32>() {
            directives.push(Directive::CompileErrorLine(number));
        }
    }

    if let Some(caps) = EXPECT_RUNTIME_ERROR_PATTERN.captures(line) {
        directives.push(Directive::RuntimeError {
            message: caps[2].to_string(),
            handled: caps.get(1).is_some(),
        });
    }

    if let Some(caps) = STDIN_PATTERN.captures(line) {
        directives.push(Directive::StdinLine(caps[1].to_string()));
    }

    if let Some(caps) = SKIP_PATTERN.captures(line) {
        directives.push(Directive::Skip(caps[1].to_string()));
    }

    if line.contains(NONTEST_MARKER) {
        directives.push(Directive::NonTest);
    }

    directives
}

/// `// expect error` that is not the start of `// expect error line N`.
fn expects_bare_compile_error(line: &str) -> bool {
    line.match_indices(EXPECT_ERROR_MARKER)
        .any(|(at, marker)| !line[at + marker.len()..].starts_with(" line"))
}
