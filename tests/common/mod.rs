//! # Scratch checkouts for runner tests
//!
//! A [`Checkout`] is a temporary directory laid out like a wrencc source tree:
//! `build/wrencc` and `lib/wren-main/{test,example}`. The compiler is a shell
//! script that never looks at Wren. For a fixture `x.wren` it either prints
//! `x.wren.compile_err` to stderr and exits 65, or installs `x.wren.sh` as the
//! compiled program.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

const FAKE_COMPILER: &str = r#"#!/bin/sh
# wrencc --module=<name> -o <artifact> <fixture>
artifact="$3"
fixture="$4"
if [ -f "$fixture.compile_err" ]; then
    cat "$fixture.compile_err" >&2
    exit 65
fi
cp "$fixture.sh" "$artifact" && chmod +x "$artifact"
"#;

pub struct Checkout {
    dir: TempDir,
}

impl Checkout {
    /// A checkout with the fake compiler installed as `build/wrencc<suffix>`.
    pub fn new() -> Self {
        Self::with_suffix("")
    }

    pub fn with_suffix(suffix: &str) -> Self {
        let checkout = Self::without_compiler();
        let compiler = checkout
            .root()
            .join("build")
            .join(format!("wrencc{}", suffix));
        write_executable(&compiler, FAKE_COMPILER);
        checkout
    }

    pub fn without_compiler() -> Self {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["build", "lib/wren-main/test", "lib/wren-main/example"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn wren_dir(&self) -> PathBuf {
        self.root().join("lib").join("wren-main")
    }

    pub fn compiler(&self) -> PathBuf {
        self.root().join("build").join("wrencc")
    }

    /// Writes a fixture whose compiled form is the shell `program`.
    pub fn fixture(&self, relative: &str, source: &str, program: &str) -> PathBuf {
        let path = self.write_source(relative, source);
        write_executable(&sidecar(&path, "sh"), &format!("#!/bin/sh\n{}", program));
        path
    }

    /// Writes a fixture the compiler rejects with `stderr`.
    pub fn rejected_fixture(&self, relative: &str, source: &str, stderr: &str) -> PathBuf {
        let path = self.write_source(relative, source);
        fs::write(sidecar(&path, "compile_err"), stderr).unwrap();
        path
    }

    fn write_source(&self, relative: &str, source: &str) -> PathBuf {
        let path = self.wren_dir().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, source).unwrap();
        path
    }
}

fn sidecar(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn write_executable(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
