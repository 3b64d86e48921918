//! Cross-process error transport.
//!
//! Serializing an error directly loses fidelity across a process boundary:
//! the job has no real source file and call arguments are not guaranteed
//! serializable. [`SerializableThrowable`] snapshots the parts that do
//! survive (message, code, file, line, trace with arguments dropped) and
//! knows how to re-render trace entries that point at a synthetic source
//! into a numbered listing with the failing line marked.

use std::fmt;
use std::io::IsTerminal;

use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};

use super::job::{Job, JobError};
use super::wrapper;

/// One trace entry. Call arguments are dropped at capture time, not
/// sanitized: they may be unserializable or sensitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub function: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
}

/// Snapshot of a raised error that survives serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableThrowable {
    message: String,
    code: i64,
    file: String,
    line: u32,
    trace: Vec<TraceEntry>,
}

/// An error reconstructed on the parent side of the boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredThrowable {
    pub message: String,
    pub code: i64,
    pub file: String,
    pub line: u32,
    pub trace: Vec<TraceEntry>,
}

impl fmt::Display for RecoveredThrowable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RecoveredThrowable {}

impl SerializableThrowable {
    pub fn new(
        message: impl Into<String>,
        code: i64,
        file: impl Into<String>,
        line: u32,
        trace: Vec<TraceEntry>,
    ) -> Self {
        Self {
            message: message.into(),
            code,
            file: file.into(),
            line,
            trace,
        }
    }

    /// Wrap a failed job: the "file" is the job rendered through the wrapper
    /// template, the failing line is the dispatch call.
    pub fn from_job_error(err: &JobError, job: &Job) -> Self {
        let line = wrapper::dispatch_line();
        let trace = vec![
            TraceEntry {
                function: "dispatch".to_string(),
                file: Some(wrapper::render_with_line(job, line)),
                line: Some(line),
            },
            TraceEntry {
                function: "run_worker".to_string(),
                file: None,
                line: None,
            },
        ];
        Self::new(err.message.clone(), err.code, wrapper::render(job), line, trace)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    /// Reconstruct the error, correcting synthetic-source trace entries into
    /// numbered listings. With `relative_pathnames`, real file paths are
    /// rewritten relative to the current working directory; synthetic entries
    /// are left alone by that step. Message and code are never altered.
    pub fn recover(&self, relative_pathnames: bool) -> RecoveredThrowable {
        let colorize = std::io::stdout().is_terminal();
        let mut trace: Vec<TraceEntry> = self
            .trace
            .iter()
            .map(|entry| pretty_print_entry(entry, colorize))
            .collect();

        if relative_pathnames {
            let cwd = std::env::current_dir()
                .map(|d| d.to_string_lossy().into_owned())
                .unwrap_or_default();
            for entry in &mut trace {
                let Some(file) = &entry.file else { continue };
                if file.contains(wrapper::SOURCE_MARKER) || cwd.is_empty() {
                    continue;
                }
                entry.file = Some(file.replace(&cwd, ""));
            }
        }

        RecoveredThrowable {
            message: self.message.clone(),
            code: self.code,
            file: self.file.clone(),
            line: self.line,
            trace,
        }
    }
}

/// Re-render a synthetic-source trace entry as a line-numbered listing with
/// the failing line marked. Entries pointing at real files, and entries whose
/// blob is shorter than the computed offset, come back unmodified.
fn pretty_print_entry(entry: &TraceEntry, colorize: bool) -> TraceEntry {
    let (Some(file), Some(line)) = (&entry.file, entry.line) else {
        return entry.clone();
    };
    if !file.contains(wrapper::SOURCE_MARKER) {
        return entry.clone();
    }

    let offset = (wrapper::header_line_count() + 1) as u32;
    if line <= offset {
        return entry.clone();
    }
    let correct_line = (line - offset) as usize;

    let mut lines: Vec<String> = file.split('\n').map(str::to_string).collect();
    if correct_line >= lines.len() {
        return entry.clone();
    }

    // Line 0 is the wrapper header carrying the marker; the gutter starts
    // after it.
    for i in 1..lines.len() {
        let is_correct = i == correct_line;
        let marker = if is_correct { ">" } else { "" };
        let prefix = format!("{marker} {i}|");
        let mut padded = format!("{prefix:>5}{}", lines[i]);
        if is_correct && colorize {
            padded = padded.magenta().to_string();
        }
        lines[i] = padded;
    }
    if let Some(last) = lines.last_mut() {
        *last = strip_line_suffix(last);
    }

    TraceEntry {
        function: entry.function.clone(),
        file: Some(lines.join("\n")),
        line: Some(correct_line as u32),
    }
}

/// Drop a trailing `}:<digits>` artifact from the closing line of a blob.
fn strip_line_suffix(line: &str) -> String {
    if let Some(pos) = line.rfind("}:") {
        let tail = &line[pos + 2..];
        if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
            return line[..pos + 1].to_string();
        }
    }
    line.to_string()
}
