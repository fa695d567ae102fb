//! Compiling fixtures with the candidate compiler and running the result.
//!
//! The driver owns two subprocess invocations per fixture. Compilation is a
//! plain blocking call. Running the artifact is bounded by a wall-clock
//! deadline: the main thread polls the child handle while helper threads pump
//! its pipes, and a child still alive at the deadline is killed and reaped.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::errors::{HarnessError, HarnessResult};
use crate::fixture::{Fixture, MODULE_NAME};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// What the compiler printed and how it exited. Streams are kept raw so
/// decoding failures surface during validation.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CompileOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Hands the compiler's own diagnostics to validation, for fixtures whose
    /// expected outcome is a failed compile.
    pub fn into_execution(self) -> ExecutionResult {
        ExecutionResult {
            exit_code: self.exit_code,
            stdout: self.stdout,
            stderr: self.stderr,
            timed_out: false,
        }
    }
}

/// Raw observations from one run of a compiled fixture.
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub timed_out: bool,
}

/// Captured streams as text, with CRLF normalised to LF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedOutput {
    pub stdout: String,
    pub stderr: String,
    /// False if either stream held invalid UTF-8 and was decoded lossily.
    pub valid_utf8: bool,
}

impl ExecutionResult {
    pub fn decode(&self) -> DecodedOutput {
        let (stdout, stdout_ok) = decode_stream(&self.stdout);
        let (stderr, stderr_ok) = decode_stream(&self.stderr);
        DecodedOutput {
            stdout,
            stderr,
            valid_utf8: stdout_ok && stderr_ok,
        }
    }
}

fn decode_stream(bytes: &[u8]) -> (String, bool) {
    let (text, ok) = match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), true),
        Err(_) => (String::from_utf8_lossy(bytes).into_owned(), false),
    };
    (text.replace("\r\n", "\n"), ok)
}

/// Drives the candidate compiler and the programs it produces.
#[derive(Debug, Clone)]
pub struct Driver {
    compiler: PathBuf,
    artifact: PathBuf,
    timeout: Duration,
}

impl Driver {
    /// `artifact` is where the compiler is told to write its output. It is
    /// overwritten for every fixture.
    pub fn new(compiler: impl Into<PathBuf>, artifact: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            compiler: compiler.into(),
            artifact: artifact.into(),
            timeout,
        }
    }

    pub fn compiler(&self) -> &Path {
        &self.compiler
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `<compiler> --module=test -o <artifact> <fixture>`.
    pub fn compile(&self, fixture: &Fixture) -> HarnessResult<CompileOutput> {
        self.remove_stale_artifact()?;

        debug!(
            compiler = %self.compiler.display(),
            fixture = %fixture.path.display(),
            "compiling fixture"
        );
        let output = Command::new(&self.compiler)
            .arg(format!("--module={}", MODULE_NAME))
            .arg("-o")
            .arg(&self.artifact)
            .arg(&fixture.path)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| HarnessError::Spawn {
                program: self.compiler.clone(),
                source,
            })?;

        let exit_code = exit_code(output.status);
        debug!(exit_code, "compiler finished");
        Ok(CompileOutput {
            exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    /// Runs the compiled artifact, feeding it `input` on stdin.
    ///
    /// On unix the program leads its own process group, so a timeout kills
    /// anything it started along with it.
    pub fn run(&self, input: &[u8]) -> HarnessResult<ExecutionResult> {
        debug!(artifact = %self.artifact.display(), stdin_bytes = input.len(), "running artifact");
        let mut cmd = Command::new(&self.artifact);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt as _;
            cmd.process_group(0);
        }

        let mut child = cmd
            .spawn()
            .map_err(|source| HarnessError::Spawn {
                program: self.artifact.clone(),
                source,
            })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let input = input.to_vec();
        let stdin_thread = thread::spawn(move || -> io::Result<()> {
            if let Some(mut stdin) = stdin {
                match stdin.write_all(&input).and_then(|()| stdin.flush()) {
                    // A program that never reads its input closes the pipe early.
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                    other => other?,
                }
            }
            Ok(())
        });
        let stdout_thread = thread::spawn(move || read_all(stdout));
        let stderr_thread = thread::spawn(move || read_all(stderr));

        let (status, timed_out) = wait_with_deadline(&mut child, self.timeout)?;

        stdin_thread
            .join()
            .unwrap_or(Ok(()))
            .map_err(|e| HarnessError::io("writing child stdin", e))?;
        let stdout = stdout_thread
            .join()
            .unwrap_or_else(|_| Ok(Vec::new()))
            .map_err(|e| HarnessError::io("reading child stdout", e))?;
        let stderr = stderr_thread
            .join()
            .unwrap_or_else(|_| Ok(Vec::new()))
            .map_err(|e| HarnessError::io("reading child stderr", e))?;

        let exit_code = exit_code(status);
        debug!(exit_code, timed_out, "artifact finished");
        Ok(ExecutionResult {
            exit_code,
            stdout,
            stderr,
            timed_out,
        })
    }

    fn remove_stale_artifact(&self) -> HarnessResult<()> {
        match fs::remove_file(&self.artifact) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(HarnessError::io("removing previous artifact", e)),
        }
    }
}

/// Waits for `child` until `timeout` has elapsed, then kills it.
///
/// Returns the exit status and whether the deadline was hit.
pub fn wait_with_deadline(child: &mut Child, timeout: Duration) -> HarnessResult<(ExitStatus, bool)> {
    let deadline = Instant::now().checked_add(timeout);

    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|e| HarnessError::io("polling child", e))?
        {
            return Ok((status, false));
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            kill_process_group(child);
            // Killing a child that exited since the last poll is harmless.
            if let Err(e) = child.kill() {
                warn!(error = %e, "failed to kill timed out child");
            }
            let status = child
                .wait()
                .map_err(|e| HarnessError::io("reaping killed child", e))?;
            return Ok((status, true));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kills every process in the group led by `child`. Descendants that keep the
/// output pipes open would otherwise outlive the deadline.
fn kill_process_group(child: &Child) {
    #[cfg(unix)]
    {
        let Ok(pid) = i32::try_from(child.id()) else {
            return;
        };
        unsafe {
            let _ = libc::kill(-pid, libc::SIGKILL);
        }
    }
    #[cfg(not(unix))]
    {
        let _ = child;
    }
}

fn read_all<R: Read>(reader: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt as _;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
