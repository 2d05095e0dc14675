//! Single-slot publication cell for the backend handle.
//!
//! One writer (the loader task), many readers (every service clone). The
//! slot starts [`Absent`](Readiness::Absent) and moves to exactly one
//! terminal state; readers never observe `Absent` again afterwards.
//! Publishing consumes the [`ReadinessCell`], so a second terminal write is
//! unrepresentable.

use std::sync::Arc;

use tokio::sync::watch;

use crate::backend::BackendHandle;

/// Publication state of the backend slot.
#[derive(Clone, Default)]
pub enum Readiness {
    /// Load still in flight.
    #[default]
    Absent,
    /// Backend loaded and available.
    Ready(BackendHandle),
    /// Load failed; the rendered error is shared by every caller.
    Failed(Arc<str>),
}

impl Readiness {
    fn is_terminal(&self) -> bool {
        !matches!(self, Readiness::Absent)
    }
}

/// Writer half — owned by the loader task, consumed on publish.
pub(crate) struct ReadinessCell {
    tx: watch::Sender<Readiness>,
}

impl ReadinessCell {
    /// Publish the terminal state. Dropping the sender afterwards is fine:
    /// the value stays readable and late subscribers still observe it.
    pub(crate) fn publish(self, state: Readiness) {
        let _ = self.tx.send(state);
    }
}

/// Reader half — cheaply cloneable, one per service handle.
#[derive(Clone)]
pub(crate) struct ReadinessWatch {
    rx: watch::Receiver<Readiness>,
}

impl ReadinessWatch {
    /// Suspend until the slot holds a terminal state, then return the
    /// backend or the shared failure reason.
    ///
    /// Each call is its own one-shot subscription on the watch channel —
    /// no polling. A writer that disappears without publishing (loader task
    /// aborted) reads as a failure, never as a hang.
    pub(crate) async fn backend(&self) -> Result<BackendHandle, Arc<str>> {
        let mut rx = self.rx.clone();
        let state = match rx.wait_for(Readiness::is_terminal).await {
            Ok(slot) => slot.clone(),
            Err(_) => return Err("backend loader stopped before publishing".into()),
        };
        match state {
            Readiness::Ready(backend) => Ok(backend),
            Readiness::Failed(reason) => Err(reason),
            // wait_for only yields on a terminal state.
            Readiness::Absent => Err("backend readiness lost".into()),
        }
    }
}

pub(crate) fn cell() -> (ReadinessCell, ReadinessWatch) {
    let (tx, rx) = watch::channel(Readiness::Absent);
    (ReadinessCell { tx }, ReadinessWatch { rx })
}
