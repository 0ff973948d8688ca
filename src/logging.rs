//! Job-scoped, human-readable log lines.
//!
//! Every event a coalescer applies is written here once, in application order.
//! These lines are separate from the crate's own `tracing` diagnostics.

use crate::core::JobId;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tracing::{Level, event};

/// Sink for log lines belonging to a single job. Fire-and-forget.
pub trait JobLogger: Send + Sync {
    fn info(&self, text: &str);

    fn error(&self, text: &str, cause: Option<&(dyn Error + 'static)>);
}

/// Produces a [`JobLogger`] bound to one job id.
pub trait JobLogFactory: Send + Sync {
    fn for_job(&self, job_id: &JobId) -> Arc<dyn JobLogger>;
}

/// Writes job log lines as `tracing` events under the `job_log` target.
#[derive(Debug, Clone)]
pub struct TracingJobLogger {
    job_id: JobId,
}

impl TracingJobLogger {
    pub fn new(job_id: JobId) -> Self {
        Self { job_id }
    }
}

impl JobLogger for TracingJobLogger {
    fn info(&self, text: &str) {
        event!(target: "job_log", Level::INFO, job_id = %self.job_id, "{}", text);
    }

    fn error(&self, text: &str, cause: Option<&(dyn Error + 'static)>) {
        match cause {
            Some(cause) => event!(
                target: "job_log",
                Level::ERROR,
                job_id = %self.job_id,
                error = %cause,
                "{}",
                text
            ),
            None => event!(target: "job_log", Level::ERROR, job_id = %self.job_id, "{}", text),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingJobLogs;

impl JobLogFactory for TracingJobLogs {
    fn for_job(&self, job_id: &JobId) -> Arc<dyn JobLogger> {
        Arc::new(TracingJobLogger::new(job_id.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobLogLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLogLine {
    pub level: JobLogLevel,
    pub text: String,
    pub cause: Option<String>,
}

/// Keeps job log lines in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryJobLogger {
    lines: Arc<Mutex<Vec<JobLogLine>>>,
}

impl MemoryJobLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<JobLogLine> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.lines().into_iter().map(|line| line.text).collect()
    }

    fn push(&self, line: JobLogLine) {
        match self.lines.lock() {
            Ok(mut lines) => lines.push(line),
            Err(poisoned) => poisoned.into_inner().push(line),
        }
    }
}

impl JobLogger for MemoryJobLogger {
    fn info(&self, text: &str) {
        self.push(JobLogLine {
            level: JobLogLevel::Info,
            text: text.to_string(),
            cause: None,
        });
    }

    fn error(&self, text: &str, cause: Option<&(dyn Error + 'static)>) {
        self.push(JobLogLine {
            level: JobLogLevel::Error,
            text: text.to_string(),
            cause: cause.map(|cause| cause.to_string()),
        });
    }
}

/// Factory handing out one shared [`MemoryJobLogger`] per job id.
#[derive(Debug, Clone, Default)]
pub struct MemoryJobLogs {
    loggers: Arc<Mutex<HashMap<JobId, MemoryJobLogger>>>,
}

impl MemoryJobLogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logger(&self, job_id: &JobId) -> MemoryJobLogger {
        let mut loggers = match self.loggers.lock() {
            Ok(loggers) => loggers,
            Err(poisoned) => poisoned.into_inner(),
        };
        loggers.entry(job_id.clone()).or_default().clone()
    }
}

impl JobLogFactory for MemoryJobLogs {
    fn for_job(&self, job_id: &JobId) -> Arc<dyn JobLogger> {
        Arc::new(self.logger(job_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StoreError;

    #[test]
    fn test_memory_logger_records_levels_and_causes() {
        let logger = MemoryJobLogger::new();
        logger.info("Job queued");
        let cause = StoreError::Unavailable("connection reset".to_string());
        logger.error("Status update failed", Some(&cause));

        let lines = logger.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].level, JobLogLevel::Info);
        assert_eq!(lines[0].cause, None);
        assert_eq!(lines[1].level, JobLogLevel::Error);
        assert_eq!(
            lines[1].cause.as_deref(),
            Some("Store unavailable: connection reset")
        );
    }

    #[test]
    fn test_memory_factory_shares_logger_per_job() {
        let logs = MemoryJobLogs::new();
        let job = JobId::from("job-3");
        logs.for_job(&job).info("first");
        logs.for_job(&job).info("second");
        logs.for_job(&JobId::from("other")).info("elsewhere");

        assert_eq!(logs.logger(&job).texts(), vec!["first", "second"]);
    }
}
