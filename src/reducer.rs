//! Pure application of status events onto a snapshot.

use crate::core::{JobStatus, StatusEvent, StatusSnapshot};

/// Applies a single event and returns the next snapshot.
///
/// A `Failed` event arriving after the job was canceled leaves the snapshot
/// untouched: cancellation wins over a late failure report.
pub fn apply_event(mut snapshot: StatusSnapshot, event: &StatusEvent) -> StatusSnapshot {
    match event {
        StatusEvent::Initialized { .. } => {}
        StatusEvent::Queued { .. } => {
            snapshot.status = JobStatus::Queued;
        }
        StatusEvent::Started { at, .. } => {
            snapshot.started_at = Some(*at);
            snapshot.status = JobStatus::Started;
        }
        StatusEvent::WorkerAssigned { worker_id, .. } => {
            snapshot.worker_id = Some(worker_id.clone());
        }
        StatusEvent::FileDownloading { .. } => {
            snapshot.status = JobStatus::FileDownloading;
        }
        StatusEvent::Finished { at, result, .. } => {
            snapshot.finished_at = Some(*at);
            snapshot.result = Some(result.clone());
            snapshot.status = JobStatus::Finished;
        }
        StatusEvent::Canceled { at, .. } => {
            snapshot.finished_at = Some(*at);
            snapshot.status = JobStatus::Canceled;
        }
        StatusEvent::Failed { at, error, .. } => {
            if snapshot.status != JobStatus::Canceled {
                snapshot.finished_at = Some(*at);
                snapshot.status = JobStatus::Failed;
                snapshot.failure = Some(error.clone());
            }
        }
    }
    snapshot
}

/// Left fold of [`apply_event`] over `events` in order.
pub fn fold_events<'a, I>(snapshot: StatusSnapshot, events: I) -> StatusSnapshot
where
    I: IntoIterator<Item = &'a StatusEvent>,
{
    events.into_iter().fold(snapshot, apply_event)
}
