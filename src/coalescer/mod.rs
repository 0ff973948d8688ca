//! Per-job status coalescer.
//!
//! A coalescer is one tokio task that owns a job's status snapshot. It loads
//! the snapshot once, then turns incoming [`StatusEvent`]s into persist calls
//! against a [`StatusStore`], never with more than one store call in flight.
//! Events that arrive while a call is outstanding are buffered and written
//! together once it completes. The task stops after an idle timeout, when all
//! handles are gone, or on the first store failure.

mod state;
mod worker;

pub use state::CoalescerExit;

use crate::config::CoalescerConfig;
use crate::core::{CoalescerError, JobId, Result, StatusEvent};
use crate::logging::{JobLogFactory, JobLogger};
use crate::store::StatusStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, info_span};
use worker::CoalescerWorker;

/// Builder for a single job's coalescer.
pub struct StatusCoalescer {
    job_id: JobId,
    store: Arc<dyn StatusStore>,
    logger: Arc<dyn JobLogger>,
    config: CoalescerConfig,
}

impl StatusCoalescer {
    pub fn new(
        job_id: impl Into<JobId>,
        store: Arc<dyn StatusStore>,
        logger: Arc<dyn JobLogger>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            store,
            logger,
            config: CoalescerConfig::default(),
        }
    }

    /// Builds a coalescer whose job logger comes from `logs`.
    pub fn from_factory(
        job_id: impl Into<JobId>,
        store: Arc<dyn StatusStore>,
        logs: &dyn JobLogFactory,
    ) -> Self {
        let job_id = job_id.into();
        let logger = logs.for_job(&job_id);
        Self::new(job_id, store, logger)
    }

    pub fn with_config(mut self, config: CoalescerConfig) -> Self {
        self.config = config;
        self
    }

    /// Starts the coalescer on the current tokio runtime.
    ///
    /// The initial fetch is issued immediately; events sent before it
    /// resolves are applied on top of the fetched snapshot.
    pub fn spawn(self) -> CoalescerTask {
        let (sender, inbox) = mpsc::unbounded_channel();
        let span = info_span!("status_coalescer", job_id = %self.job_id);
        let worker = CoalescerWorker::new(
            self.job_id.clone(),
            self.store,
            self.logger,
            self.config,
            inbox,
        );
        let join_handle = tokio::spawn(worker.run().instrument(span));

        CoalescerTask {
            handle: CoalescerHandle {
                job_id: self.job_id,
                sender,
            },
            join_handle,
        }
    }
}

/// Cloneable intake for one running coalescer.
#[derive(Debug, Clone)]
pub struct CoalescerHandle {
    job_id: JobId,
    sender: mpsc::UnboundedSender<StatusEvent>,
}

impl CoalescerHandle {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Queues an event without waiting for it to be applied.
    pub fn send(&self, event: StatusEvent) -> Result<()> {
        if event.job_id() != &self.job_id {
            return Err(CoalescerError::JobIdMismatch {
                expected: self.job_id.to_string(),
                actual: event.job_id().to_string(),
            });
        }
        self.sender
            .send(event)
            .map_err(|_| CoalescerError::Terminated(self.job_id.to_string()))
    }

    /// True once the coalescer task has stopped and no longer accepts events.
    pub fn is_terminated(&self) -> bool {
        self.sender.is_closed()
    }
}

/// A spawned coalescer: its intake handle plus the task it runs on.
pub struct CoalescerTask {
    handle: CoalescerHandle,
    join_handle: JoinHandle<CoalescerExit>,
}

impl CoalescerTask {
    pub fn handle(&self) -> CoalescerHandle {
        self.handle.clone()
    }

    pub fn send(&self, event: StatusEvent) -> Result<()> {
        self.handle.send(event)
    }

    /// Waits for the coalescer to stop and reports why.
    ///
    /// Drops this task's own handle first, so a coalescer with no other
    /// handles finishes its pending work and exits with
    /// [`CoalescerExit::InboxClosed`].
    pub async fn join(self) -> Result<CoalescerExit> {
        let Self {
            handle,
            join_handle,
        } = self;
        drop(handle);
        Ok(join_handle.await?)
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }

    /// Stops the task without waiting for outstanding store calls.
    pub fn abort(&self) {
        self.join_handle.abort();
    }
}
