use crate::core::{CoalescerError, StatusEvent, StatusSnapshot, StoreResult};

/// Where a coalescer is in its lifecycle.
///
/// Exactly one store call is outstanding in `AwaitingInitial` and
/// `Persisting`; none in `Idle`. Buffers only exist while a call is
/// outstanding, so an idle coalescer never holds unapplied events.
#[derive(Debug)]
pub(crate) enum CoalescerState {
    AwaitingInitial {
        buffer: Vec<StatusEvent>,
    },
    Idle {
        snapshot: StatusSnapshot,
    },
    Persisting {
        /// Snapshot handed to the outstanding persist call.
        snapshot: StatusSnapshot,
        buffer: Vec<StatusEvent>,
    },
}

impl CoalescerState {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::AwaitingInitial { .. } => "awaiting_initial",
            Self::Idle { .. } => "idle",
            Self::Persisting { .. } => "persisting",
        }
    }

    pub(crate) fn is_idle(&self) -> bool {
        matches!(self, Self::Idle { .. })
    }
}

/// Everything the processing loop reacts to, in the order it observed it.
#[derive(Debug)]
pub(crate) enum Message {
    Event(StatusEvent),
    Fetched(StoreResult<StatusSnapshot>),
    Persisted(StoreResult<()>),
    IdleElapsed,
    InboxClosed,
}

impl Message {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Event(_) => "event",
            Self::Fetched(_) => "fetched",
            Self::Persisted(_) => "persisted",
            Self::IdleElapsed => "idle_elapsed",
            Self::InboxClosed => "inbox_closed",
        }
    }
}

/// Why a coalescer stopped.
#[derive(Debug)]
pub enum CoalescerExit {
    /// No event arrived for the configured idle timeout.
    IdleTimeout,
    /// Every handle was dropped and all accepted events were persisted.
    InboxClosed,
    /// The initial fetch or a persist failed; the instance did no further I/O.
    Failed(CoalescerError),
}

impl CoalescerExit {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn error(&self) -> Option<&CoalescerError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}
