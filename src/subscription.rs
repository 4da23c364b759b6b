use crate::types::ReceiverSnapshot;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// Stream of snapshots, one per poll cycle that produced one
///
/// Cycles skipped under [`SkipCycleOnUnreachable`] publish nothing, so a quiet
/// stream means either no poll ran or the receiver could not be reached.
/// Each snapshot replaces the previous one wholesale; a subscriber that falls
/// behind jumps ahead to the oldest snapshot still buffered.
///
/// [`SkipCycleOnUnreachable`]: crate::ReconciliationPolicy::SkipCycleOnUnreachable
pub struct SnapshotReceiver {
    rx: broadcast::Receiver<ReceiverSnapshot>,
}

impl SnapshotReceiver {
    pub(crate) fn new(rx: broadcast::Receiver<ReceiverSnapshot>) -> Self {
        Self { rx }
    }

    /// Wait for the next snapshot, `None` once the receiver is dropped
    pub async fn recv(&mut self) -> Option<ReceiverSnapshot> {
        loop {
            match self.rx.recv().await {
                Ok(snapshot) => return Some(snapshot),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Subscriber behind, dropped {} stale snapshots", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next buffered snapshot, if any
    pub fn try_recv(&mut self) -> Option<ReceiverSnapshot> {
        loop {
            match self.rx.try_recv() {
                Ok(snapshot) => return Some(snapshot),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!("Subscriber behind, dropped {} stale snapshots", skipped);
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}
