//! Synthetic source rendering for jobs.
//!
//! A job has no real source file. When a handler fails, the worker renders
//! the job descriptor through a fixed wrapper template and reports that text
//! as the failing "file", so diagnostics can show a listing instead of a
//! dangling path. Trace correction in [`super::throwable`] derives its line
//! offset from this template; the two must stay in lockstep, which is why
//! the offset is computed from the template text rather than hardcoded.

use super::job::Job;

/// Marker identifying a synthetic, in-memory source.
pub const SOURCE_MARKER: &str = "inline://";

/// Wrapper around the job dispatch listing. `{body}` is replaced with the
/// rendered dispatch call.
const WRAPPER_TEMPLATE: &str = "fn run() {\n{body}\n}";

/// Number of template lines preceding the body.
pub fn header_line_count() -> usize {
    WRAPPER_TEMPLATE
        .split("{body}")
        .next()
        .map(|header| header.lines().count())
        .unwrap_or(0)
}

/// Source line of the dispatch call inside the rendered wrapper.
pub fn dispatch_line() -> u32 {
    (header_line_count() + 2) as u32
}

/// Render a job as a synthetic source blob, marker included.
pub fn render(job: &Job) -> String {
    let args = serde_json::to_string(&job.args).unwrap_or_else(|_| "null".to_string());
    let body = format!("    dispatch({:?}, {args})", job.name);
    let source = WRAPPER_TEMPLATE.replace("{body}", &body);
    format!("{SOURCE_MARKER}{source}")
}

/// Render a job the way a trace entry records it: the blob with the failing
/// line glued on after the closing brace.
pub fn render_with_line(job: &Job, line: u32) -> String {
    format!("{}:{line}", render(job))
}
