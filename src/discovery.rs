use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::errors::{HarnessError, HarnessResult};
use crate::fixture::FixtureKind;

/// A directory of fixtures that all share one [`FixtureKind`].
#[derive(Debug, Clone)]
pub struct Suite {
    pub root: PathBuf,
    pub kind: FixtureKind,
    /// Names of top-level subdirectories that belong to another suite.
    pub ignored: Vec<String>,
}

impl Suite {
    pub fn new(root: impl Into<PathBuf>, kind: FixtureKind) -> Self {
        Self {
            root: root.into(),
            kind,
            ignored: Vec::new(),
        }
    }

    pub fn ignoring(mut self, names: &[&str]) -> Self {
        self.ignored.extend(names.iter().map(|name| name.to_string()));
        self
    }
}

/// The suites under a Wren checkout, in the order they are run: the language
/// tests, the embedding API tests, then the examples.
pub fn default_suites(wren_dir: &Path) -> Vec<Suite> {
    let test_dir = wren_dir.join("test");
    vec![
        Suite::new(&test_dir, FixtureKind::Test).ignoring(&["api", "benchmark"]),
        Suite::new(test_dir.join("api"), FixtureKind::ApiTest),
        Suite::new(wren_dir.join("example"), FixtureKind::Example),
    ]
}

/// A fixture file found on disk, not yet parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFixture {
    pub path: PathBuf,
    /// Path relative to the checkout, with `/` separators.
    pub relative: String,
    pub kind: FixtureKind,
}

/// Finds `.wren` fixtures below a Wren checkout.
#[derive(Debug, Clone)]
pub struct FixtureDiscoverer {
    base: PathBuf,
    filter: Option<String>,
    exclusions: Vec<String>,
}

impl FixtureDiscoverer {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            filter: None,
            exclusions: Vec::new(),
        }
    }

    /// Only keep fixtures whose relative path starts with `prefix`.
    pub fn with_filter(mut self, prefix: Option<String>) -> Self {
        self.filter = prefix;
        self
    }

    /// Examples whose relative path contains any of these substrings are
    /// never run.
    pub fn with_exclusions(mut self, exclusions: Vec<String>) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Collects the fixtures of every suite, suite by suite. Within a suite
    /// files are sorted so runs are deterministic.
    pub fn discover(&self, suites: &[Suite]) -> HarnessResult<Vec<DiscoveredFixture>> {
        let mut fixtures = Vec::new();
        for suite in suites {
            fixtures.extend(self.discover_suite(suite)?);
        }
        Ok(fixtures)
    }

    fn discover_suite(&self, suite: &Suite) -> HarnessResult<Vec<DiscoveredFixture>> {
        if !suite.root.is_dir() {
            warn!(root = %suite.root.display(), "suite directory not found, skipping");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&suite.root)
            .into_iter()
            .filter_entry(|entry| !is_ignored_dir(entry, &suite.ignored));
        for entry in walker {
            let entry = entry.map_err(|source| HarnessError::Walk {
                root: suite.root.clone(),
                source,
            })?;
            if !entry.file_type().is_file() || !is_wren_file(entry.path()) {
                continue;
            }
            files.push(entry.into_path());
        }
        files.sort();

        let mut fixtures = Vec::new();
        for path in files {
            let relative = relative_path(&self.base, &path);
            if !self.is_selected(&relative, suite.kind) {
                continue;
            }
            fixtures.push(DiscoveredFixture {
                path,
                relative,
                kind: suite.kind,
            });
        }
        debug!(root = %suite.root.display(), count = fixtures.len(), "discovered fixtures");
        Ok(fixtures)
    }

    fn is_selected(&self, relative: &str, kind: FixtureKind) -> bool {
        if let Some(prefix) = &self.filter {
            if !relative.starts_with(prefix.as_str()) {
                return false;
            }
        }
        if kind == FixtureKind::Example
            && self
                .exclusions
                .iter()
                .any(|excluded| relative.contains(excluded.as_str()))
        {
            return false;
        }
        true
    }
}

fn is_ignored_dir(entry: &walkdir::DirEntry, ignored: &[String]) -> bool {
    entry.depth() == 1
        && entry.file_type().is_dir()
        && ignored
            .iter()
            .any(|name| entry.file_name() == name.as_str())
}

fn is_wren_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "wren")
}

/// `path` relative to `base`, joined with `/` on every platform. Paths outside
/// `base` are returned whole.
pub fn relative_path(base: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
