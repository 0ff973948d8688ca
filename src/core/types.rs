use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the tracked job. Immutable for the lifetime of a coalescer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Lifecycle status of a job as stored in the status store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Initialized,
    Queued,
    Started,
    FileDownloading,
    Finished,
    Canceled,
    Failed,
}

impl JobStatus {
    /// Finished, Canceled and Failed end a job's lifecycle.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Canceled | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Queued => "queued",
            Self::Started => "started",
            Self::FileDownloading => "file_downloading",
            Self::Finished => "finished",
            Self::Canceled => "canceled",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure payload attached to a failed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl JobFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{} (caused by: {})", self.message, cause),
            None => f.write_str(&self.message),
        }
    }
}

/// Full status record of one job, as fetched from and written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub job_id: JobId,
    pub status: JobStatus,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub worker_id: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub failure: Option<JobFailure>,
}

impl StatusSnapshot {
    pub fn new(job_id: impl Into<JobId>, status: JobStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            started_at: None,
            finished_at: None,
            worker_id: None,
            result: None,
            failure: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Finished.is_terminal());
        assert!(JobStatus::Canceled.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Started.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
    }

    #[test]
    fn test_snapshot_deserializes_with_missing_optionals() {
        let snapshot: StatusSnapshot =
            serde_json::from_str(r#"{"job_id":"job-1","status":"queued"}"#).unwrap();
        assert_eq!(snapshot, StatusSnapshot::new("job-1", JobStatus::Queued));
    }

    #[test]
    fn test_failure_display_includes_cause() {
        let failure = JobFailure::new("worker crashed").with_cause("oom");
        assert_eq!(failure.to_string(), "worker crashed (caused by: oom)");
        assert_eq!(JobFailure::new("boom").to_string(), "boom");
    }
}
