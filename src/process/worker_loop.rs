//! Orchestration of one or more workers.
//!
//! A [`Loop`] turns (label, job, control) tuples into one [`Worker`] each,
//! runs them to completion and hands the results back keyed by label. Calls
//! block until every worker has exited. A failed worker is never retried;
//! its failure comes back as a result with a nonzero exit code or a carried
//! throwable, left to the caller to interpret.
//!
//! Workers run sequentially by default. With a parallelism above one they
//! are pooled across threads, capped at the CPU count; parallel workers
//! must not share a root directory or database target, the loop provides
//! no locking over either.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::mpsc;
use std::time::Duration;

use super::ProcessError;
use super::control::Control;
use super::job::Job;
use super::request::Request;
use super::worker::{Worker, WorkerResult, default_worker_program};

#[derive(Debug, Clone)]
pub struct Loop {
    program: PathBuf,
    timeout: Option<Duration>,
    parallelism: usize,
}

impl Default for Loop {
    fn default() -> Self {
        Self::new()
    }
}

impl Loop {
    pub fn new() -> Self {
        Self {
            program: default_worker_program(),
            timeout: None,
            parallelism: 1,
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Pool workers across up to `parallelism` threads, capped at the number
    /// of CPUs.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.clamp(1, num_cpus::get());
        self
    }

    /// Run every job and collect the results keyed by label.
    pub fn run(
        &self,
        jobs: Vec<(String, Job, Control)>,
    ) -> Result<BTreeMap<String, WorkerResult>, ProcessError> {
        let workers: Vec<Worker> = jobs
            .into_iter()
            .map(|(label, job, control)| self.worker(label, job, control))
            .collect();

        if self.parallelism <= 1 || workers.len() <= 1 {
            let mut results = BTreeMap::new();
            for worker in workers {
                let result = worker.run()?;
                results.insert(result.id().to_string(), result);
            }
            return Ok(results);
        }

        self.run_pooled(workers)
    }

    /// Single-job convenience entry point.
    pub fn run_job(&self, job: Job, control: Control) -> Result<WorkerResult, ProcessError> {
        self.worker("main".to_string(), job, control).run()
    }

    fn worker(&self, label: String, job: Job, control: Control) -> Worker {
        let mut worker =
            Worker::new(label, Request::new(control, job)).with_program(&self.program);
        if let Some(timeout) = self.timeout {
            worker = worker.with_timeout(timeout);
        }
        worker
    }

    fn run_pooled(
        &self,
        workers: Vec<Worker>,
    ) -> Result<BTreeMap<String, WorkerResult>, ProcessError> {
        let total = workers.len();
        let queue = Mutex::new(workers.into_iter());
        let (sender, receiver) = mpsc::channel();
        let threads = self.parallelism.min(total);

        std::thread::scope(|scope| {
            for _ in 0..threads {
                let sender = sender.clone();
                let queue = &queue;
                scope.spawn(move || {
                    loop {
                        let next = queue
                            .lock()
                            .unwrap_or_else(std::sync::PoisonError::into_inner)
                            .next();
                        let Some(worker) = next else { break };
                        let outcome = worker.run();
                        if sender.send(outcome).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(sender);

        let mut results = BTreeMap::new();
        for outcome in receiver {
            let result = outcome?;
            results.insert(result.id().to_string(), result);
        }
        Ok(results)
    }
}
