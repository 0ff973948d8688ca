pub mod error;
pub mod event;
pub mod types;

pub use error::{CoalescerError, Result, StoreError, StoreResult};
pub use event::StatusEvent;
pub use types::{JobFailure, JobId, JobStatus, StatusSnapshot};
