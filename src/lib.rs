// ============================================================================
// Status Coalescer Library
// ============================================================================

pub mod coalescer;
pub mod config;
pub mod core;
pub mod logging;
pub mod reducer;
pub mod store;

// Re-export main types for convenience
pub use coalescer::{CoalescerExit, CoalescerHandle, CoalescerTask, StatusCoalescer};
pub use config::CoalescerConfig;
pub use crate::core::{
    CoalescerError, JobFailure, JobId, JobStatus, Result, StatusEvent, StatusSnapshot, StoreError,
    StoreResult,
};
pub use logging::{
    JobLogFactory, JobLogLevel, JobLogLine, JobLogger, MemoryJobLogger, MemoryJobLogs,
    TracingJobLogger, TracingJobLogs,
};
pub use reducer::{apply_event, fold_events};
pub use store::{FnStatusStore, InMemoryStatusStore, StatusStore};
