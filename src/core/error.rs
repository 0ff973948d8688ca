use thiserror::Error;

/// Failures reported by a [`StatusStore`](crate::store::StatusStore) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Job '{0}' not found")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Write rejected: {0}")]
    Rejected(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum CoalescerError {
    #[error("Initial fetch failed for job '{job_id}': {source}")]
    InitialFetch {
        job_id: String,
        #[source]
        source: StoreError,
    },

    #[error("Persist failed for job '{job_id}': {source}")]
    Persist {
        job_id: String,
        #[source]
        source: StoreError,
    },

    #[error("Event for job '{actual}' sent to coalescer of job '{expected}'")]
    JobIdMismatch { expected: String, actual: String },

    #[error("Coalescer for job '{0}' has terminated")]
    Terminated(String),

    #[error("Coalescer task join error: {0}")]
    Join(String),
}

impl CoalescerError {
    /// True for the two store failures that end an instance.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InitialFetch { .. } | Self::Persist { .. })
    }
}

pub type Result<T> = std::result::Result<T, CoalescerError>;

impl From<tokio::task::JoinError> for CoalescerError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Join(err.to_string())
    }
}
