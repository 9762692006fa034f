use crate::notifications::manager::NotificationManager;
use crate::ports;

use std::time::Duration;
use tokio::task::JoinHandle;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

pub struct SweeperHandle {
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Periodically removes read notifications past the retention window.
#[derive(Debug, Clone)]
pub struct RetentionSweeper<S, T> {
    manager: NotificationManager<S, T>,
    time: T,
    interval: Duration,
}

impl<S, T> RetentionSweeper<S, T>
where
    S: ports::NotificationStore,
    T: ports::TimeProvider,
{
    pub fn new(manager: NotificationManager<S, T>, time: T, interval: Duration) -> Self {
        Self {
            manager,
            time,
            interval,
        }
    }

    pub fn spawn(self) -> SweeperHandle {
        let handle = tokio::spawn(async move {
            loop {
                self.time.sleep(self.interval).await;
                self.sweep_once().await;
            }
        });
        SweeperHandle { handle }
    }

    pub(crate) async fn sweep_once(&self) -> usize {
        match self.manager.purge_old().await {
            Ok(purged) => {
                tracing::info!(purged, "notification retention sweep finished");
                purged
            }
            Err(err) => {
                tracing::error!(error = %err, "notification retention sweep failed");
                0
            }
        }
    }
}
