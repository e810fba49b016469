//! External tools run as subprocesses: the [`epubcheck`] validator and
//! the [`convert`] converter.
//!
//! Each tool runs under a fixed timeout and is never retried.

pub mod convert;
pub mod epubcheck;

use crate::errors::{ToolError, ToolResult};
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured result of a finished subprocess.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Output {
    /// `-1` when terminated by a signal.
    pub(crate) status: i32,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

impl Output {
    pub(crate) fn success(&self) -> bool {
        self.status == 0
    }

    /// Stderr, falling back to stdout when stderr is empty.
    pub(crate) fn diagnostics(&self) -> &str {
        match self.stderr.trim() {
            "" => self.stdout.trim(),
            stderr => stderr,
        }
    }

    /// Convert a non-zero exit into [`ToolError::Failed`].
    pub(crate) fn check(self, program: &Path) -> ToolResult<Self> {
        if self.success() {
            return Ok(self);
        }
        Err(ToolError::Failed {
            program: display_name(program),
            status: self.status,
            diagnostics: self.diagnostics().to_owned(),
        })
    }
}

/// Run `program` to completion, killing it once `timeout` elapses.
pub(crate) fn run<I, S>(program: &Path, args: I, timeout: Duration) -> ToolResult<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let name = display_name(program);
    tracing::debug!(program = %name, timeout = timeout.as_secs(), "running tool");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ToolError::Spawn {
            program: name.clone(),
            source,
        })?;

    // Pipes are drained concurrently so a chatty tool cannot block on a full buffer
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let status = wait(&mut child, timeout).map_err(|source| ToolError::Spawn {
        program: name.clone(),
        source,
    })?;

    let Some(status) = status else {
        tracing::warn!(program = %name, "tool timed out");
        return Err(ToolError::TimedOut {
            program: name,
            seconds: timeout.as_secs(),
        });
    };
    Ok(Output {
        status: status.code().unwrap_or(-1),
        stdout: join(stdout),
        stderr: join(stderr),
    })
}

/// `None` when the child was killed after `timeout`.
fn wait(child: &mut Child, timeout: Duration) -> std::io::Result<Option<std::process::ExitStatus>> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if started.elapsed() >= timeout {
            // The child may exit between polling and killing
            let _ = child.kill();
            child.wait()?;
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut bytes = Vec::new();
            let _ = pipe.read_to_end(&mut bytes);
            String::from_utf8_lossy(&bytes).into_owned()
        })
    })
}

fn join(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

/// Locate an executable on `PATH`.
pub(crate) fn which(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .flat_map(|dir| executable_names(name).map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

fn executable_names(name: &str) -> impl Iterator<Item = String> + '_ {
    let windows = cfg!(windows).then(|| format!("{name}.exe"));
    std::iter::once(name.to_owned()).chain(windows)
}

fn display_name(program: &Path) -> String {
    program
        .file_name()
        .unwrap_or(program.as_os_str())
        .to_string_lossy()
        .into_owned()
}
