//! Runs every discovered fixture through compile, run and validation.

use termcolor::WriteColor;
use tracing::{debug, info};

use crate::cli::output::Reporter;
use crate::config::HarnessConfig;
use crate::discovery::{default_suites, DiscoveredFixture, FixtureDiscoverer};
use crate::driver::{CompileOutput, Driver};
use crate::errors::{HarnessError, HarnessResult};
use crate::fixture::{Fixture, Parsed};
use crate::summary::RunSummary;
use crate::validate::validate;

pub const COMPILE_FAILURE: &str = "Compiler exited with non-zero status.";
pub const TIMED_OUT: &str = "Timed out.";

const ARTIFACT_NAME: &str = "fixture";

/// Runs the whole suite, reporting on stdout.
pub fn run_suite(config: &HarnessConfig) -> HarnessResult<RunSummary> {
    let mut reporter = Reporter::stdout(config);
    run_suite_with(config, &mut reporter)
}

pub fn run_suite_with<W: WriteColor>(
    config: &HarnessConfig,
    reporter: &mut Reporter<W>,
) -> HarnessResult<RunSummary> {
    let compiler = config.locate_compiler()?;

    let artifact_dir = tempfile::Builder::new()
        .prefix("wrencc-test")
        .tempdir()
        .map_err(|e| HarnessError::io("creating artifact directory", e))?;
    let artifact = artifact_dir
        .path()
        .join(format!("{}{}", ARTIFACT_NAME, std::env::consts::EXE_SUFFIX));
    let driver = Driver::new(compiler, artifact, config.timeout);

    let fixtures = FixtureDiscoverer::new(&config.wren_dir)
        .with_filter(config.filter.clone())
        .with_exclusions(config.exclusions.clone())
        .discover(&default_suites(&config.wren_dir))?;
    info!(
        count = fixtures.len(),
        compiler = %driver.compiler().display(),
        timeout = ?driver.timeout(),
        "starting run"
    );

    let mut summary = RunSummary::new();
    for discovered in &fixtures {
        reporter.status(&summary).map_err(report_error)?;
        run_fixture(&driver, reporter, &mut summary, discovered)?;
    }
    reporter.finish(&summary).map_err(report_error)?;

    info!(
        passed = summary.passed,
        failed = summary.failed,
        skipped = summary.skipped,
        "run finished"
    );
    Ok(summary)
}

fn run_fixture<W: WriteColor>(
    driver: &Driver,
    reporter: &mut Reporter<W>,
    summary: &mut RunSummary,
    discovered: &DiscoveredFixture,
) -> HarnessResult<()> {
    debug!(fixture = %discovered.relative, kind = discovered.kind.as_str(), "loading");
    let mut fixture = match Fixture::load(&discovered.path, discovered.kind) {
        Ok(Parsed::Runnable(fixture)) => fixture,
        Ok(Parsed::Skipped(reason)) => {
            debug!(fixture = %discovered.relative, %reason, "skipped");
            summary.record_skip(reason);
            return Ok(());
        }
        Ok(Parsed::NonTest) => return Ok(()),
        Err(e) => Fixture::unreadable(&discovered.path, discovered.kind, &e),
    };

    if fixture.passed() {
        if let Some(compiled) = execute(driver, &mut fixture) {
            reporter.compiler_output(&compiled).map_err(report_error)?;
        }
    }

    summary.record(&fixture);
    reporter
        .fixture_result(&discovered.relative, &fixture)
        .map_err(report_error)
}

/// Compiles and runs one fixture, appending every failure to it.
///
/// Returns what the compiler printed, if it could be started at all.
pub fn execute(driver: &Driver, fixture: &mut Fixture) -> Option<CompileOutput> {
    let compiled = match driver.compile(fixture) {
        Ok(compiled) => compiled,
        Err(e) => {
            fixture.fail(e.describe());
            return None;
        }
    };

    let result = if compiled.succeeded() {
        let input = fixture.stdin.clone().unwrap_or_default();
        match driver.run(&input) {
            Ok(result) => result,
            Err(e) => {
                fixture.fail(e.describe());
                return Some(compiled);
            }
        }
    } else if fixture.expects_compile_errors() {
        compiled.clone().into_execution()
    } else {
        fixture.fail(COMPILE_FAILURE);
        return Some(compiled);
    };

    if result.timed_out {
        fixture.fail(TIMED_OUT);
        return Some(compiled);
    }

    let failures = validate(fixture, &result);
    fixture.failures.extend(failures);
    Some(compiled)
}

fn report_error(e: std::io::Error) -> HarnessError {
    HarnessError::io("writing report", e)
}
