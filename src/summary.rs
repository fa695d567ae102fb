use std::collections::BTreeMap;

use crate::fixture::Fixture;

/// Pass/fail/skip tallies for one invocation of the runner.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Skip counts keyed by the reason given in `// skip:`. Ordered by reason.
    pub skip_reasons: BTreeMap<String, usize>,
    pub expectations: usize,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_skip(&mut self, reason: impl Into<String>) {
        self.skipped += 1;
        *self.skip_reasons.entry(reason.into()).or_insert(0) += 1;
    }

    /// Records a fixture that went through compile, run and validation.
    pub fn record(&mut self, fixture: &Fixture) {
        self.expectations += fixture.expectation_count();
        if fixture.passed() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Process exit code for this run.
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::fixture::{FixtureKind, Parsed};

    fn fixture(source: &str) -> Fixture {
        match Fixture::parse(Path::new("test/x.wren"), FixtureKind::Test, source) {
            Parsed::Runnable(fixture) => fixture,
            other => panic!("expected runnable fixture, got {:?}", other),
        }
    }

    #[test]
    fn records_passes_failures_and_expectations() {
        let mut summary = RunSummary::new();

        summary.record(&fixture("// expect: a\n// expect: b\n"));
        let mut failing = fixture("// expect: c\n");
        failing.fail("Timed out.");
        summary.record(&failing);

        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.expectations, 3);
        assert!(summary.has_failures());
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn skips_are_tallied_by_reason() {
        let mut summary = RunSummary::new();
        summary.record_skip("slow");
        summary.record_skip("needs input");
        summary.record_skip("slow");

        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.skip_reasons.get("slow"), Some(&2));
        let reasons: Vec<&str> = summary.skip_reasons.keys().map(String::as_str).collect();
        assert_eq!(reasons, vec!["needs input", "slow"]);
        assert_eq!(summary.passed + summary.failed + summary.expectations, 0);
        assert_eq!(summary.exit_code(), 0);
    }
}
