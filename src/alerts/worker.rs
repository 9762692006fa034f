use crate::alerts::fanout::FanOut;
use crate::ports;
use crate::types::listing::Listing;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("fan-out queue is full")]
    Full,
    #[error("fan-out worker has stopped")]
    Closed,
}

/// Submission side of the fan-out worker. Cloned into request handlers so a
/// status change can hand off the listing and return immediately.
#[derive(Debug, Clone)]
pub struct FanOutQueue {
    sender: mpsc::Sender<Listing>,
}

impl FanOutQueue {
    pub fn submit(&self, listing: Listing) -> Result<(), QueueError> {
        self.sender.try_send(listing).map_err(|err| match err {
            TrySendError::Full(_) => QueueError::Full,
            TrySendError::Closed(_) => QueueError::Closed,
        })
    }
}

pub struct FanOutWorkerHandle {
    handle: JoinHandle<()>,
}

impl FanOutWorkerHandle {
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Starts the worker draining a bounded queue of activated listings. Each
/// pass runs in its own task so a panicking pass is logged and the worker
/// moves on to the next listing.
pub fn spawn_fan_out_worker<N, S, T, D>(
    fan_out: FanOut<N, S, T, D>,
    capacity: usize,
) -> (FanOutQueue, FanOutWorkerHandle)
where
    N: ports::NotificationStore,
    S: ports::SavedSearchStore,
    T: ports::TimeProvider,
    D: ports::DeliveryChannel,
{
    let (sender, mut receiver) = mpsc::channel::<Listing>(capacity.max(1));
    let handle = tokio::spawn(async move {
        while let Some(listing) = receiver.recv().await {
            let listing_id = listing.id;
            let fan_out = fan_out.clone();
            let pass = tokio::spawn(async move { fan_out.on_listing_activated(&listing).await });
            if let Err(err) = pass.await {
                tracing::error!(%listing_id, error = %err, "fan-out pass aborted");
            }
        }
        tracing::info!("fan-out worker stopped");
    });
    (FanOutQueue { sender }, FanOutWorkerHandle { handle })
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use crate::alerts::fanout::tests::scenario_listing;
    use crate::notifications::manager::tests::{FixedTime, start_time};
    use crate::notifications::{NotificationManager, NotificationService};
    use crate::ports::{NotificationStore, SavedSearchStore};
    use crate::realtime::ConnectionRegistry;
    use crate::types::saved_search::{SavedSearch, SearchCriteria};
    use uuid::Uuid;

    fn fan_out(store: &MemoryStore) -> FanOut<MemoryStore, MemoryStore, FixedTime, ConnectionRegistry> {
        let manager = NotificationManager::new(store.clone(), FixedTime::new(start_time()));
        FanOut::new(
            NotificationService::new(manager, ConnectionRegistry::new()),
            store.clone(),
        )
    }

    #[tokio::test]
    async fn submit__should_run_fan_out_in_background() {
        // Given
        let store = MemoryStore::new();
        SavedSearchStore::insert(
            &store,
            SavedSearch {
                id: Uuid::new_v4(),
                owner_user_id: "student-a".to_string(),
                title: "Anything".to_string(),
                criteria: SearchCriteria::default(),
                alerts_enabled: true,
                created_at: start_time(),
            },
        )
        .await
        .expect("insert saved search");
        let (queue, handle) = spawn_fan_out_worker(fan_out(&store), 4);

        // When
        queue.submit(scenario_listing()).expect("submit");
        for _ in 0..100 {
            if store.unread_count("student-a").await.expect("count") > 0 {
                break;
            }
            tokio::task::yield_now().await;
        }

        // Then
        assert_eq!(store.unread_count("student-a").await.expect("count"), 1);
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test]
    async fn submit__should_report_full_queue() {
        // Given
        let store = MemoryStore::new();
        let (queue, handle) = spawn_fan_out_worker(fan_out(&store), 1);

        // When
        // The worker has not been polled yet, so the first listing stays queued.
        let first = queue.submit(scenario_listing());
        let second = queue.submit(scenario_listing());

        // Then
        assert_eq!(first, Ok(()));
        assert_eq!(second, Err(QueueError::Full));
        handle.abort();
    }

    #[tokio::test]
    async fn submit__should_report_stopped_worker() {
        // Given
        let store = MemoryStore::new();
        let (queue, handle) = spawn_fan_out_worker(fan_out(&store), 1);
        handle.abort();
        for _ in 0..100 {
            if handle.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }

        // When
        let result = queue.submit(scenario_listing());

        // Then
        assert_eq!(result, Err(QueueError::Closed));
    }
}
