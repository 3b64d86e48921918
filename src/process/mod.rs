//! Out-of-process execution protocol.
//!
//! A caller bundles a [`Job`] with a [`Control`] into a [`Request`], a
//! [`Worker`] runs it in a freshly spawned child process, and a [`Loop`]
//! coordinates one or more workers and returns their [`WorkerResult`]s.
//! Errors raised in the child cross back as a [`SerializableThrowable`].
//!
//! Execution is local, synchronous and single-hop: the calling thread
//! blocks until the child exits, and workers never spawn workers.

pub mod control;
pub mod job;
pub mod parser;
pub mod request;
pub mod runtime;
pub mod throwable;
pub mod worker;
pub mod worker_loop;
pub mod wrapper;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub use control::{Control, ControlError};
pub use job::{Job, JobError, JobHandler, JobRegistry};
pub use parser::ProtocolError;
pub use request::Request;
pub use runtime::run_worker;
pub use throwable::{RecoveredThrowable, SerializableThrowable, TraceEntry};
pub use worker::{THROWABLE_MARKER, Worker, WorkerResult, default_worker_program};
pub use worker_loop::Loop;

/// Errors raised on the parent side of the protocol.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error("failed to spawn worker {program}: {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },
    #[error("worker {id}: {source}")]
    ChildIo {
        id: String,
        source: std::io::Error,
    },
    #[error("worker {id}: child did not exit within {timeout:?}")]
    Timeout { id: String, timeout: Duration },
    #[error("worker {id}: output capture failed")]
    Capture { id: String },
    #[error("failed to decode carried throwable: {detail}")]
    ThrowableDecode { detail: String },
}
