use crate::core::{JobId, StatusSnapshot, StoreResult};
use async_trait::async_trait;
use std::future::Future;

mod in_memory;

pub use in_memory::InMemoryStatusStore;

/// Persistent status store a coalescer reads from once and then writes to.
///
/// Both calls are opaque to the coalescer; any error ends the instance.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Loads the current snapshot of a job.
    async fn fetch(&self, job_id: &JobId) -> StoreResult<StatusSnapshot>;

    /// Writes a full replacement snapshot.
    async fn persist(&self, snapshot: StatusSnapshot) -> StoreResult<()>;
}

/// Adapts a pair of async closures into a [`StatusStore`].
pub struct FnStatusStore<F, P> {
    fetch: F,
    persist: P,
}

impl<F, P> FnStatusStore<F, P> {
    pub fn new(fetch: F, persist: P) -> Self {
        Self { fetch, persist }
    }
}

#[async_trait]
impl<F, FFut, P, PFut> StatusStore for FnStatusStore<F, P>
where
    F: Fn(JobId) -> FFut + Send + Sync,
    FFut: Future<Output = StoreResult<StatusSnapshot>> + Send + 'static,
    P: Fn(StatusSnapshot) -> PFut + Send + Sync,
    PFut: Future<Output = StoreResult<()>> + Send + 'static,
{
    async fn fetch(&self, job_id: &JobId) -> StoreResult<StatusSnapshot> {
        (self.fetch)(job_id.clone()).await
    }

    async fn persist(&self, snapshot: StatusSnapshot) -> StoreResult<()> {
        (self.persist)(snapshot).await
    }
}
