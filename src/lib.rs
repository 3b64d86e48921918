//! Out-of-process job execution and site installation lifecycle.
//!
//! Some lifecycle operations of a site fixture (first-time installation,
//! multisite conversion, option updates) define process-wide constants and
//! cannot run twice in one process. This crate runs them once, elsewhere:
//! a [`process::Request`] marshals a job plus its execution environment to a
//! freshly spawned worker process and a [`process::WorkerResult`] brings
//! back what happened, including a reconstructed error when the job failed.
//!
//! The [`site::Installation`] state machine drives a root directory through
//! its lifecycle on top of that protocol:
//!
//! ```no_run
//! use sitewright::site::{Db, Installation, MultisiteMode};
//!
//! # fn main() -> Result<(), sitewright::site::InstallationError> {
//! let db = Db::new("fixtures", "admin", "secret", "localhost");
//! let mut installation = Installation::scaffold("/tmp/site", "latest")?;
//! installation
//!     .configure(&db, MultisiteMode::SingleSite)?
//!     .install(
//!         "https://site.test",
//!         "admin",
//!         "password",
//!         "admin@site.test",
//!         "Test Site",
//!     )?;
//! assert!(!installation.is_multisite());
//! # Ok(())
//! # }
//! ```
//!
//! The worker side of the protocol is the `sitewright worker` subcommand:
//! it reads a request payload from standard input, applies the control,
//! dispatches the job through [`site::jobs::registry`] and exits with the
//! job's outcome.

pub mod output;
pub mod process;
pub mod site;

pub use process::{
    Control, Job, JobError, JobRegistry, Loop, ProcessError, Request, SerializableThrowable,
    Worker, WorkerResult,
};
pub use site::{
    ConfigurationData, Db, Installation, InstallationError, InstallationState, MultisiteMode,
    Salts, ScaffoldRegistry,
};
