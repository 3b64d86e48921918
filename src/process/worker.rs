//! One worker, one child process, one result.
//!
//! A [`Worker`] serializes its request, launches a worker child process with
//! the payload on standard input, blocks until it exits and captures exit
//! code, stdout and stderr. A child that failed its job emits a carried
//! throwable as a marker-prefixed frame on stderr; the parent strips and
//! decodes it here.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::ProcessError;
use super::request::Request;
use super::throwable::SerializableThrowable;

/// Prefix of the stderr line carrying a serialized throwable.
pub const THROWABLE_MARKER: &str = "sitewright-throwable:";

/// Outcome of a single worker execution. Constructed once, never mutated.
#[derive(Debug, Clone)]
pub struct WorkerResult {
    id: String,
    exit_code: i32,
    stdout: String,
    stderr: String,
    throwable: Option<SerializableThrowable>,
}

impl WorkerResult {
    pub fn new(
        id: impl Into<String>,
        exit_code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        throwable: Option<SerializableThrowable>,
    ) -> Self {
        Self {
            id: id.into(),
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            throwable,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn throwable(&self) -> Option<&SerializableThrowable> {
        self.throwable.as_ref()
    }
}

/// Resolve the worker child binary: the `SITEWRIGHT_WORKER_BIN` environment
/// variable wins, then a `sitewright` binary next to the current executable
/// (or one directory above it, where test executables live), then `PATH`.
pub fn default_worker_program() -> PathBuf {
    if let Ok(program) = std::env::var("SITEWRIGHT_WORKER_BIN") {
        return PathBuf::from(program);
    }
    let name = format!("sitewright{}", std::env::consts::EXE_SUFFIX);
    if let Ok(exe) = std::env::current_exe() {
        let mut dir = exe.parent();
        for _ in 0..2 {
            let Some(d) = dir else { break };
            let candidate = d.join(&name);
            if candidate.is_file() {
                return candidate;
            }
            dir = d.parent();
        }
    }
    PathBuf::from(name)
}

/// A single blocking child-process execution of one request.
#[derive(Debug, Clone)]
pub struct Worker {
    id: String,
    request: Request,
    program: PathBuf,
    timeout: Option<Duration>,
}

impl Worker {
    pub fn new(id: impl Into<String>, request: Request) -> Self {
        Self {
            id: id.into(),
            request,
            program: default_worker_program(),
            timeout: None,
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Kill the child and fail instead of hanging when it outlives the
    /// deadline. Without a timeout a hung child hangs the caller.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Spawn the child, feed it the payload and wait for its result.
    pub fn run(&self) -> Result<WorkerResult, ProcessError> {
        let payload = self.request.payload()?;

        let mut child = Command::new(&self.program)
            .arg("worker")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(payload.as_bytes())
                .map_err(|source| ProcessError::ChildIo {
                    id: self.id.clone(),
                    source,
                })?;
        }

        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        let status = self.wait(&mut child)?;

        let stdout = join_reader(stdout_reader, &self.id)?;
        let raw_stderr = join_reader(stderr_reader, &self.id)?;
        let (stderr, throwable) = extract_throwable(&raw_stderr)?;

        Ok(WorkerResult::new(
            self.id.clone(),
            status.code().unwrap_or(-1),
            stdout,
            stderr,
            throwable,
        ))
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, ProcessError> {
        let Some(timeout) = self.timeout else {
            return child.wait().map_err(|source| ProcessError::ChildIo {
                id: self.id.clone(),
                source,
            });
        };

        let deadline = Instant::now() + timeout;
        loop {
            let waited = child.try_wait().map_err(|source| ProcessError::ChildIo {
                id: self.id.clone(),
                source,
            })?;
            if let Some(status) = waited {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProcessError::Timeout {
                    id: self.id.clone(),
                    timeout,
                });
            }
            thread::sleep(Duration::from_millis(15));
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buffer);
        }
        buffer
    })
}

fn join_reader(handle: JoinHandle<String>, id: &str) -> Result<String, ProcessError> {
    handle
        .join()
        .map_err(|_| ProcessError::Capture { id: id.to_string() })
}

/// Split a carried throwable out of the captured stderr text.
fn extract_throwable(
    stderr: &str,
) -> Result<(String, Option<SerializableThrowable>), ProcessError> {
    let mut throwable = None;
    let mut kept = Vec::new();

    for line in stderr.lines() {
        let Some(frame) = line.strip_prefix(THROWABLE_MARKER) else {
            kept.push(line);
            continue;
        };
        let bytes = STANDARD
            .decode(frame.trim())
            .map_err(|err| ProcessError::ThrowableDecode {
                detail: err.to_string(),
            })?;
        throwable = Some(serde_json::from_slice(&bytes).map_err(|err| {
            ProcessError::ThrowableDecode {
                detail: err.to_string(),
            }
        })?);
    }

    let mut text = kept.join("\n");
    if !text.is_empty() && stderr.ends_with('\n') {
        text.push('\n');
    }
    Ok((text, throwable))
}
