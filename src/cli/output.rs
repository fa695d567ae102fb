//! Handles all user-facing output for the runner.
//!
//! This module owns the live status line, per-fixture PASS/FAIL reports, the
//! compiler's echoed output and the closing summary. Everything is written
//! through a [`WriteColor`] sink so tests can capture it uncoloured.

use std::io::{self, Write};

use termcolor::{Color, ColorSpec, StandardStream, WriteColor};

use crate::config::HarnessConfig;
use crate::driver::CompileOutput;
use crate::fixture::Fixture;
use crate::summary::RunSummary;

/// Clears the terminal line and returns the cursor to column 0.
const ERASE_LINE: &str = "\x1b[2K\r";

pub struct Reporter<W: WriteColor> {
    out: W,
    label: String,
    show_passes: bool,
    static_output: bool,
}

impl Reporter<StandardStream> {
    pub fn stdout(config: &HarnessConfig) -> Self {
        Reporter::new(StandardStream::stdout(config.color), config)
    }
}

impl<W: WriteColor> Reporter<W> {
    pub fn new(out: W, config: &HarnessConfig) -> Self {
        Self {
            out,
            label: config.compiler.display().to_string(),
            show_passes: config.show_passes,
            static_output: config.static_output,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// `(<compiler>) Passed: P Failed: F Skipped: S `, redrawn in place unless
    /// static output was requested.
    pub fn status(&mut self, summary: &RunSummary) -> io::Result<()> {
        self.begin_line()?;
        write!(self.out, "({}) Passed: ", self.label)?;
        self.colored(Color::Green, &summary.passed.to_string())?;
        write!(self.out, " Failed: ")?;
        self.colored(Color::Red, &summary.failed.to_string())?;
        write!(self.out, " Skipped: ")?;
        self.colored(Color::Yellow, &summary.skipped.to_string())?;
        write!(self.out, " ")?;
        self.end_line(false)
    }

    /// Echoes whatever the compiler printed while building a fixture.
    pub fn compiler_output(&mut self, compiled: &CompileOutput) -> io::Result<()> {
        if !compiled.stdout.is_empty() {
            let text = String::from_utf8_lossy(&compiled.stdout);
            self.begin_line()?;
            write!(self.out, "Compiler output: {}", text.trim_end())?;
            self.end_line(true)?;
        }
        if !compiled.stderr.is_empty() {
            let text = String::from_utf8_lossy(&compiled.stderr);
            self.begin_line()?;
            write!(self.out, "Compiler error: {}", text.trim_end())?;
            self.end_line(true)?;
        }
        Ok(())
    }

    pub fn fixture_result(&mut self, relative: &str, fixture: &Fixture) -> io::Result<()> {
        if fixture.passed() {
            if self.show_passes {
                self.begin_line()?;
                self.colored(Color::Green, "PASS")?;
                write!(self.out, ": {}", relative)?;
                self.end_line(true)?;
            }
            return Ok(());
        }

        self.begin_line()?;
        self.colored(Color::Red, "FAIL")?;
        write!(self.out, ": {}", relative)?;
        self.end_line(true)?;
        for failure in &fixture.failures {
            write!(self.out, "      ")?;
            self.out
                .set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_intense(true))?;
            write!(self.out, "{}", failure)?;
            self.out.reset()?;
            writeln!(self.out)?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    /// Clears the status line and prints the totals and skip reasons.
    pub fn finish(&mut self, summary: &RunSummary) -> io::Result<()> {
        self.begin_line()?;
        self.end_line(false)?;

        if summary.failed == 0 {
            write!(self.out, "All ")?;
            self.colored(Color::Green, &summary.passed.to_string())?;
            writeln!(self.out, " tests passed ({} expectations).", summary.expectations)?;
        } else {
            self.colored(Color::Green, &summary.passed.to_string())?;
            write!(self.out, " tests passed. ")?;
            self.colored(Color::Red, &summary.failed.to_string())?;
            writeln!(self.out, " tests failed.")?;
        }

        for (reason, count) in &summary.skip_reasons {
            write!(self.out, "Skipped ")?;
            self.colored(Color::Yellow, &count.to_string())?;
            writeln!(self.out, " tests: {}", reason)?;
        }
        self.out.flush()
    }

    fn begin_line(&mut self) -> io::Result<()> {
        if !self.static_output {
            write!(self.out, "{}", ERASE_LINE)?;
        }
        Ok(())
    }

    /// A status line stays open so the next update can overwrite it.
    fn end_line(&mut self, keep: bool) -> io::Result<()> {
        if self.static_output || keep {
            writeln!(self.out)?;
        }
        self.out.flush()
    }

    fn colored(&mut self, color: Color, text: &str) -> io::Result<()> {
        self.out.set_color(ColorSpec::new().set_fg(Some(color)))?;
        write!(self.out, "{}", text)?;
        self.out.reset()
    }
}
