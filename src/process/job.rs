//! Job descriptors and the handler registry that resolves them.
//!
//! A job crossing the process boundary is a stable name plus a structured
//! argument record; the executing process resolves the name against a
//! [`JobRegistry`] of handlers. The caller decides what runs, the child
//! executes it in isolation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error raised by a job handler, carried back to the parent process as a
/// serializable throwable. The numeric code survives the boundary.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct JobError {
    pub message: String,
    pub code: i64,
}

impl JobError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: 0,
        }
    }

    pub fn with_code(message: impl Into<String>, code: i64) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

impl From<std::io::Error> for JobError {
    fn from(err: std::io::Error) -> Self {
        JobError::new(err.to_string())
    }
}

impl From<serde_json::Error> for JobError {
    fn from(err: serde_json::Error) -> Self {
        JobError::new(format!("invalid job arguments: {err}"))
    }
}

/// A unit of work: a registered handler name and its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

impl Job {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Build a job from any serializable argument record.
    pub fn with_args<T: Serialize>(name: impl Into<String>, args: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            name: name.into(),
            args: serde_json::to_value(args)?,
        })
    }
}

pub type JobHandler = fn(&Value) -> Result<(), JobError>;

/// Named handlers available to a worker process.
#[derive(Default)]
pub struct JobRegistry {
    handlers: BTreeMap<String, JobHandler>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, handler: JobHandler) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Run the handler registered for `job.name`.
    pub fn dispatch(&self, job: &Job) -> Result<(), JobError> {
        let handler = self
            .handlers
            .get(&job.name)
            .ok_or_else(|| JobError::with_code(format!("unknown job: {}", job.name), 127))?;
        handler(&job.args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok_handler(_args: &Value) -> Result<(), JobError> {
        Ok(())
    }

    fn failing_handler(args: &Value) -> Result<(), JobError> {
        Err(JobError::with_code(
            args["message"].as_str().unwrap_or("failed").to_string(),
            3,
        ))
    }

    #[test]
    fn dispatches_registered_handlers() {
        let mut registry = JobRegistry::new();
        registry.register("noop", ok_handler);

        assert!(registry.contains("noop"));
        assert!(registry.dispatch(&Job::new("noop", Value::Null)).is_ok());
    }

    #[test]
    fn unknown_jobs_fail_with_code_127() {
        let registry = JobRegistry::new();
        let err = registry.dispatch(&Job::new("missing", Value::Null)).unwrap_err();

        assert_eq!(err.code, 127);
        assert!(err.message.contains("missing"));
    }

    #[test]
    fn handler_errors_carry_message_and_code() {
        let mut registry = JobRegistry::new();
        registry.register("fail", failing_handler);

        let job = Job::new("fail", json!({"message": "out of disk"}));
        let err = registry.dispatch(&job).unwrap_err();
        assert_eq!(err.message, "out of disk");
        assert_eq!(err.code, 3);
    }

    #[test]
    fn jobs_round_trip_through_json() {
        let job = Job::with_args("site.install", &json!({"url": "https://site.test"})).unwrap();
        let text = serde_json::to_string(&job).unwrap();
        let parsed: Job = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, job);
    }
}
