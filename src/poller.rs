use crate::receiver::Receiver;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Background task calling [`Receiver::update`] on a fixed period
///
/// A cycle never starts before the previous one has returned; ticks missed
/// while a slow cycle runs are delayed, not bunched up.
pub struct Poller {
    stop_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl Poller {
    pub(crate) fn spawn(receiver: Arc<Receiver>, period: Duration) -> Self {
        let (stop_tx, mut stop_rx) = broadcast::channel(1);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = stop_rx.recv() => {
                        tracing::info!("Polling of {} stopped", receiver.name());
                        break;
                    }
                    _ = ticker.tick() => {
                        receiver.update().await;
                    }
                }
            }
        });

        Self { stop_tx, handle }
    }

    /// Stop polling and wait for an in-flight cycle to finish
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.handle.await {
            tracing::error!("Poller task failed: {}", e);
        }
    }
}
