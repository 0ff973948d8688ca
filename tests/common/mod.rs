#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use status_coalescer::{
    JobFailure, JobId, StatusEvent, StatusSnapshot, StatusStore, StoreError, StoreResult,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, oneshot};

/// One store call waiting for the test to answer it.
pub enum StoreCall {
    Fetch {
        job_id: JobId,
        reply: oneshot::Sender<StoreResult<StatusSnapshot>>,
    },
    Persist {
        snapshot: StatusSnapshot,
        reply: oneshot::Sender<StoreResult<()>>,
    },
}

/// A store whose every call blocks until the test replies through [`StoreCalls`].
pub struct ManualStore {
    calls: mpsc::UnboundedSender<StoreCall>,
    inflight: AtomicUsize,
    max_inflight: AtomicUsize,
    fetches: AtomicUsize,
    persists: AtomicUsize,
}

pub struct StoreCalls {
    rx: mpsc::UnboundedReceiver<StoreCall>,
}

impl ManualStore {
    pub fn new() -> (Arc<Self>, StoreCalls) {
        let (calls, rx) = mpsc::unbounded_channel();
        let store = Arc::new(Self {
            calls,
            inflight: AtomicUsize::new(0),
            max_inflight: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            persists: AtomicUsize::new(0),
        });
        (store, StoreCalls { rx })
    }

    pub fn max_inflight(&self) -> usize {
        self.max_inflight.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn persists(&self) -> usize {
        self.persists.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.inflight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_inflight.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.inflight.fetch_sub(1, Ordering::SeqCst);
    }
}

fn dropped_reply() -> StoreError {
    StoreError::Unavailable("reply dropped".to_string())
}

#[async_trait]
impl StatusStore for ManualStore {
    async fn fetch(&self, job_id: &JobId) -> StoreResult<StatusSnapshot> {
        self.enter();
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let (reply, rx) = oneshot::channel();
        let _ = self.calls.send(StoreCall::Fetch {
            job_id: job_id.clone(),
            reply,
        });
        let result = rx.await.unwrap_or_else(|_| Err(dropped_reply()));
        self.exit();
        result
    }

    async fn persist(&self, snapshot: StatusSnapshot) -> StoreResult<()> {
        self.enter();
        self.persists.fetch_add(1, Ordering::SeqCst);
        let (reply, rx) = oneshot::channel();
        let _ = self.calls.send(StoreCall::Persist { snapshot, reply });
        let result = rx.await.unwrap_or_else(|_| Err(dropped_reply()));
        self.exit();
        result
    }
}

impl StoreCalls {
    pub async fn next(&mut self) -> StoreCall {
        self.rx.recv().await.expect("store dropped")
    }

    pub async fn next_fetch(&mut self) -> (JobId, oneshot::Sender<StoreResult<StatusSnapshot>>) {
        match self.next().await {
            StoreCall::Fetch { job_id, reply } => (job_id, reply),
            StoreCall::Persist { snapshot, .. } => {
                panic!("expected fetch, got persist of {:?}", snapshot)
            }
        }
    }

    pub async fn next_persist(&mut self) -> (StatusSnapshot, oneshot::Sender<StoreResult<()>>) {
        match self.next().await {
            StoreCall::Persist { snapshot, reply } => (snapshot, reply),
            StoreCall::Fetch { job_id, .. } => panic!("expected persist, got fetch of {}", job_id),
        }
    }

    /// Answers the initial fetch with `snapshot`.
    pub async fn serve_fetch(&mut self, snapshot: StatusSnapshot) {
        let (_, reply) = self.next_fetch().await;
        reply.send(Ok(snapshot)).expect("coalescer gone");
    }

    pub fn pending(&mut self) -> bool {
        !self.rx.is_empty()
    }

    /// Answers every call with success until the store is dropped, recording
    /// persisted snapshots in order.
    pub fn serve_forever(
        mut self,
        initial: StatusSnapshot,
        persisted: mpsc::UnboundedSender<StatusSnapshot>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(call) = self.rx.recv().await {
                match call {
                    StoreCall::Fetch { reply, .. } => {
                        let _ = reply.send(Ok(initial.clone()));
                    }
                    StoreCall::Persist { snapshot, reply } => {
                        let _ = persisted.send(snapshot);
                        tokio::task::yield_now().await;
                        let _ = reply.send(Ok(()));
                    }
                }
            }
        })
    }
}

pub const JOB: &str = "job-42";

pub fn job() -> JobId {
    JobId::from(JOB)
}

pub fn t(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn queued() -> StatusEvent {
    StatusEvent::Queued { job_id: job() }
}

pub fn started(secs: i64) -> StatusEvent {
    StatusEvent::Started {
        job_id: job(),
        at: t(secs),
    }
}

pub fn assigned(worker: &str) -> StatusEvent {
    StatusEvent::WorkerAssigned {
        job_id: job(),
        worker_id: worker.to_string(),
    }
}

pub fn downloading(secs: i64) -> StatusEvent {
    StatusEvent::FileDownloading {
        job_id: job(),
        at: t(secs),
    }
}

pub fn finished(secs: i64, result: serde_json::Value) -> StatusEvent {
    StatusEvent::Finished {
        job_id: job(),
        at: t(secs),
        result,
    }
}

pub fn canceled(secs: i64) -> StatusEvent {
    StatusEvent::Canceled {
        job_id: job(),
        at: t(secs),
    }
}

pub fn failed(secs: i64, message: &str) -> StatusEvent {
    StatusEvent::Failed {
        job_id: job(),
        at: t(secs),
        error: JobFailure::new(message),
    }
}
