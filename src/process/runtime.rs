//! Child-process side of the protocol.
//!
//! The worker runtime reads one payload from its input, reconstructs the
//! request (applying the control in the process), dispatches the job through
//! the registry and exits. Failures are never silent: every error path
//! produces a nonzero exit code and a carried throwable on stderr so the
//! parent can classify what happened.

use std::io::Read;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::job::JobRegistry;
use super::request::Request;
use super::throwable::SerializableThrowable;
use super::worker::THROWABLE_MARKER;

/// Exit code for a job handler failure.
pub const EXIT_JOB_FAILED: i32 = 1;
/// Exit code for a payload that could not be decoded or applied.
pub const EXIT_BAD_REQUEST: i32 = 2;

/// Run one request read from `input` against `registry`, returning the
/// process exit code.
pub fn run_worker<R: Read>(mut input: R, registry: &JobRegistry) -> i32 {
    let mut payload = String::new();
    if let Err(err) = input.read_to_string(&mut payload) {
        emit_throwable(&SerializableThrowable::new(
            format!("failed to read request payload: {err}"),
            i64::from(EXIT_BAD_REQUEST),
            "stdin",
            0,
            Vec::new(),
        ));
        return EXIT_BAD_REQUEST;
    }

    let request = match Request::from_payload(payload.trim()) {
        Ok(request) => request,
        Err(err) => {
            emit_throwable(&SerializableThrowable::new(
                format!("failed to decode request: {err}"),
                i64::from(EXIT_BAD_REQUEST),
                "payload",
                0,
                Vec::new(),
            ));
            return EXIT_BAD_REQUEST;
        }
    };

    match registry.dispatch(request.job()) {
        Ok(()) => 0,
        Err(err) => {
            emit_throwable(&SerializableThrowable::from_job_error(&err, request.job()));
            EXIT_JOB_FAILED
        }
    }
}

/// Write a throwable to stderr as a marker-prefixed base64 frame. If even
/// that fails, the plain message still lands on stderr.
fn emit_throwable(throwable: &SerializableThrowable) {
    match serde_json::to_vec(throwable) {
        Ok(bytes) => eprintln!("{THROWABLE_MARKER}{}", STANDARD.encode(bytes)),
        Err(_) => eprintln!("{}", throwable.message()),
    }
}
