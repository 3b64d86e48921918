//! A request bundles a [`Control`] with a [`Job`] into one opaque payload.
//!
//! Decoding is staged on purpose: position 0 yields the control, which is
//! applied to prepare the process environment, and only then is position 1
//! decoded into the job. A job may reference configuration the control's
//! environment setup makes available, so the order is load-bearing.

use serde_json::Value;

use super::ProcessError;
use super::control::Control;
use super::job::Job;
use super::parser::{self, ProtocolError};

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    control: Control,
    job: Job,
}

impl Request {
    pub fn new(control: Control, job: Job) -> Self {
        Self { control, job }
    }

    /// Encode `[control, job]` as a single payload string.
    pub fn payload(&self) -> Result<String, ProtocolError> {
        let job = serde_json::to_value(&self.job)
            .map_err(|source| ProtocolError::Json { index: 1, source })?;
        parser::encode(&[self.control.to_value(), job])
    }

    /// Decode a payload, applying the control between the two stages.
    ///
    /// Intended for a freshly spawned worker process: the control mutates
    /// the process environment exactly once.
    pub fn from_payload(payload: &str) -> Result<Self, ProcessError> {
        // Decode only the control now; the job is decoded once the
        // environment it may depend on is in place.
        let control_value = take_one(parser::decode(payload, 0, 1)?)?;
        let control = Control::from_value(control_value)?;
        control.apply()?;

        let job_value = take_one(parser::decode(payload, 1, 1)?)?;
        let job: Job = serde_json::from_value(job_value)
            .map_err(|source| ProtocolError::Json { index: 1, source })?;

        Ok(Self { control, job })
    }

    pub fn control(&self) -> &Control {
        &self.control
    }

    pub fn job(&self) -> &Job {
        &self.job
    }
}

fn take_one(mut values: Vec<Value>) -> Result<Value, ProtocolError> {
    values.pop().ok_or(ProtocolError::OutOfBounds {
        offset: 0,
        end: 1,
        frames: 0,
    })
}
