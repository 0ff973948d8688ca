use super::types::{JobFailure, JobId};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One lifecycle transition reported for a job.
///
/// Events carry no sequence number; a coalescer orders them strictly by arrival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusEvent {
    Initialized {
        job_id: JobId,
    },
    Queued {
        job_id: JobId,
    },
    Started {
        job_id: JobId,
        at: DateTime<Utc>,
    },
    WorkerAssigned {
        job_id: JobId,
        worker_id: String,
    },
    FileDownloading {
        job_id: JobId,
        at: DateTime<Utc>,
    },
    Finished {
        job_id: JobId,
        at: DateTime<Utc>,
        result: serde_json::Value,
    },
    Canceled {
        job_id: JobId,
        at: DateTime<Utc>,
    },
    Failed {
        job_id: JobId,
        at: DateTime<Utc>,
        error: JobFailure,
    },
}

impl StatusEvent {
    pub fn job_id(&self) -> &JobId {
        match self {
            Self::Initialized { job_id }
            | Self::Queued { job_id }
            | Self::Started { job_id, .. }
            | Self::WorkerAssigned { job_id, .. }
            | Self::FileDownloading { job_id, .. }
            | Self::Finished { job_id, .. }
            | Self::Canceled { job_id, .. }
            | Self::Failed { job_id, .. } => job_id,
        }
    }

    /// Failed events go to the job log at error severity.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialized { .. } => f.write_str("Job initialized"),
            Self::Queued { .. } => f.write_str("Job queued"),
            Self::Started { at, .. } => write!(f, "Job started at {}", timestamp(at)),
            Self::WorkerAssigned { worker_id, .. } => {
                write!(f, "Job assigned to worker '{}'", worker_id)
            }
            Self::FileDownloading { at, .. } => {
                write!(f, "Downloading input files at {}", timestamp(at))
            }
            Self::Finished { at, result, .. } => {
                write!(f, "Job finished at {} with result {}", timestamp(at), result)
            }
            Self::Canceled { at, .. } => write!(f, "Job canceled at {}", timestamp(at)),
            Self::Failed { at, error, .. } => {
                write!(f, "Job failed at {}: {}", timestamp(at), error)
            }
        }
    }
}
