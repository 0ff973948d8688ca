use super::state::{CoalescerExit, CoalescerState, Message};
use crate::config::CoalescerConfig;
use crate::core::{CoalescerError, JobId, StatusEvent, StatusSnapshot};
use crate::logging::JobLogger;
use crate::reducer::apply_event;
use crate::store::StatusStore;
use futures::future::BoxFuture;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{Level, event};

type Transition = ControlFlow<CoalescerExit, CoalescerState>;

/// The sequential processor behind one coalescer.
///
/// Owns the inbox, the single outstanding store call and, through
/// [`CoalescerState`], the snapshot and pending buffer. Nothing here is shared.
pub(crate) struct CoalescerWorker {
    job_id: JobId,
    store: Arc<dyn StatusStore>,
    logger: Arc<dyn JobLogger>,
    config: CoalescerConfig,
    inbox: mpsc::UnboundedReceiver<StatusEvent>,
    inbox_open: bool,
    inflight: Option<BoxFuture<'static, Message>>,
}

impl CoalescerWorker {
    pub(crate) fn new(
        job_id: JobId,
        store: Arc<dyn StatusStore>,
        logger: Arc<dyn JobLogger>,
        config: CoalescerConfig,
        inbox: mpsc::UnboundedReceiver<StatusEvent>,
    ) -> Self {
        Self {
            job_id,
            store,
            logger,
            config,
            inbox,
            inbox_open: true,
            inflight: None,
        }
    }

    pub(crate) async fn run(mut self) -> CoalescerExit {
        self.inflight = Some(self.fetch_call());
        let mut state = CoalescerState::AwaitingInitial { buffer: Vec::new() };
        event!(Level::DEBUG, "coalescer started, fetching initial status");

        loop {
            let message = self.next_message(state.is_idle()).await;
            event!(
                Level::TRACE,
                state = state.name(),
                message = message.kind(),
                "coalescer dispatch"
            );
            state = match self.dispatch(state, message) {
                ControlFlow::Continue(next) => next,
                ControlFlow::Break(exit) => {
                    event!(Level::DEBUG, exit = ?exit, "coalescer stopped");
                    return exit;
                }
            };
        }
    }

    /// Waits for the next message.
    ///
    /// Queued events are taken before a completed store call, so a batch picks
    /// up everything that arrived while the call was outstanding.
    async fn next_message(&mut self, idle: bool) -> Message {
        let idle_timeout = self.config.idle_timeout();
        let message = {
            let Self {
                inbox,
                inbox_open,
                inflight,
                ..
            } = self;
            tokio::select! {
                biased;
                event = inbox.recv(), if *inbox_open => match event {
                    Some(event) => Message::Event(event),
                    None => Message::InboxClosed,
                },
                completion = poll_inflight(inflight), if inflight.is_some() => completion,
                () = sleep(idle_timeout), if idle => Message::IdleElapsed,
                else => Message::InboxClosed,
            }
        };

        match &message {
            Message::InboxClosed => self.inbox_open = false,
            Message::Fetched(_) | Message::Persisted(_) => self.inflight = None,
            _ => {}
        }
        message
    }

    fn dispatch(&mut self, state: CoalescerState, message: Message) -> Transition {
        match (state, message) {
            (CoalescerState::AwaitingInitial { mut buffer }, Message::Event(event)) => {
                buffer.push(event);
                ControlFlow::Continue(CoalescerState::AwaitingInitial { buffer })
            }
            (CoalescerState::AwaitingInitial { buffer }, Message::Fetched(Ok(snapshot))) => {
                event!(
                    Level::DEBUG,
                    status = %snapshot.status,
                    buffered = buffer.len(),
                    "initial status loaded"
                );
                if buffer.is_empty() {
                    self.enter_idle(snapshot)
                } else {
                    self.persist_batch(snapshot, buffer)
                }
            }
            (CoalescerState::AwaitingInitial { buffer }, Message::Fetched(Err(source))) => {
                event!(Level::WARN, dropped = buffer.len(), "discarding buffered events");
                self.fail(CoalescerError::InitialFetch {
                    job_id: self.job_id.to_string(),
                    source,
                })
            }

            (CoalescerState::Idle { snapshot }, Message::Event(event)) => {
                self.persist_batch(snapshot, vec![event])
            }
            (CoalescerState::Idle { .. }, Message::IdleElapsed) => {
                event!(Level::DEBUG, "idle timeout elapsed");
                ControlFlow::Break(CoalescerExit::IdleTimeout)
            }
            (CoalescerState::Idle { .. }, Message::InboxClosed) => {
                ControlFlow::Break(CoalescerExit::InboxClosed)
            }

            (CoalescerState::Persisting { snapshot, mut buffer }, Message::Event(event)) => {
                buffer.push(event);
                ControlFlow::Continue(CoalescerState::Persisting { snapshot, buffer })
            }
            (CoalescerState::Persisting { snapshot, buffer }, Message::Persisted(Ok(()))) => {
                event!(Level::DEBUG, buffered = buffer.len(), "status persisted");
                if buffer.is_empty() {
                    self.enter_idle(snapshot)
                } else {
                    self.persist_batch(snapshot, buffer)
                }
            }
            (CoalescerState::Persisting { buffer, .. }, Message::Persisted(Err(source))) => {
                if !buffer.is_empty() {
                    event!(Level::WARN, dropped = buffer.len(), "discarding buffered events");
                }
                self.fail(CoalescerError::Persist {
                    job_id: self.job_id.to_string(),
                    source,
                })
            }

            // The inbox closing only matters once the coalescer would go idle.
            (state, Message::InboxClosed) => ControlFlow::Continue(state),
            (state, message) => {
                event!(
                    Level::WARN,
                    state = state.name(),
                    message = message.kind(),
                    "ignoring unexpected message"
                );
                ControlFlow::Continue(state)
            }
        }
    }

    fn enter_idle(&self, snapshot: StatusSnapshot) -> Transition {
        if !self.inbox_open {
            return ControlFlow::Break(CoalescerExit::InboxClosed);
        }
        ControlFlow::Continue(CoalescerState::Idle { snapshot })
    }

    /// Applies `events` in order, logging each one, and issues a single persist
    /// for the resulting snapshot.
    fn persist_batch(&mut self, snapshot: StatusSnapshot, events: Vec<StatusEvent>) -> Transition {
        let batch = events.len();
        let next = events.iter().fold(snapshot, |snapshot, event| {
            self.log_event(event);
            apply_event(snapshot, event)
        });
        event!(Level::DEBUG, batch, status = %next.status, "persisting status");
        self.inflight = Some(self.persist_call(next.clone()));
        ControlFlow::Continue(CoalescerState::Persisting {
            snapshot: next,
            buffer: Vec::new(),
        })
    }

    fn log_event(&self, event: &StatusEvent) {
        let line = event.to_string();
        if event.is_failure() {
            self.logger.error(&line, None);
        } else {
            self.logger.info(&line);
        }
    }

    fn fail(&mut self, err: CoalescerError) -> Transition {
        event!(Level::ERROR, error = %err, "status coalescer failed");
        let text = match &err {
            CoalescerError::InitialFetch { .. } => "Failed to load job status",
            _ => "Failed to update job status",
        };
        self.logger.error(text, Some(&err));
        ControlFlow::Break(CoalescerExit::Failed(err))
    }

    fn fetch_call(&self) -> BoxFuture<'static, Message> {
        let store = Arc::clone(&self.store);
        let job_id = self.job_id.clone();
        Box::pin(async move { Message::Fetched(store.fetch(&job_id).await) })
    }

    fn persist_call(&self, snapshot: StatusSnapshot) -> BoxFuture<'static, Message> {
        let store = Arc::clone(&self.store);
        Box::pin(async move { Message::Persisted(store.persist(snapshot).await) })
    }
}

async fn poll_inflight(inflight: &mut Option<BoxFuture<'static, Message>>) -> Message {
    match inflight.as_mut() {
        Some(call) => call.await,
        None => std::future::pending().await,
    }
}
