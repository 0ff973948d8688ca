use super::StatusStore;
use crate::core::{JobId, StatusSnapshot, StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// An in-memory [`StatusStore`], shared between clones.
#[derive(Clone, Default)]
pub struct InMemoryStatusStore {
    snapshots: Arc<RwLock<HashMap<JobId, StatusSnapshot>>>,
    persists: Arc<AtomicU64>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds or overwrites a job's snapshot without counting as a persist.
    pub async fn insert(&self, snapshot: StatusSnapshot) {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(snapshot.job_id.clone(), snapshot);
    }

    pub async fn get(&self, job_id: &JobId) -> Option<StatusSnapshot> {
        self.snapshots.read().await.get(job_id).cloned()
    }

    /// Number of successful `persist` calls across all jobs.
    pub fn persist_count(&self) -> u64 {
        self.persists.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn fetch(&self, job_id: &JobId) -> StoreResult<StatusSnapshot> {
        self.get(job_id)
            .await
            .ok_or_else(|| StoreError::NotFound(job_id.to_string()))
    }

    async fn persist(&self, snapshot: StatusSnapshot) -> StoreResult<()> {
        let mut snapshots = self.snapshots.write().await;
        if !snapshots.contains_key(&snapshot.job_id) {
            return Err(StoreError::NotFound(snapshot.job_id.to_string()));
        }
        snapshots.insert(snapshot.job_id.clone(), snapshot);
        self.persists.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
