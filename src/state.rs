use crate::adapters::{MemoryStore, TokioTimeProvider};
use crate::alerts::{self, FanOut, FanOutQueue, FanOutWorkerHandle, SavedSearchManager};
use crate::auth::AuthState;
use crate::config::AppConfig;
use crate::notifications::{NotificationManager, NotificationService};
use crate::realtime::ConnectionRegistry;
use crate::StartupError;

use std::sync::Arc;

pub type Notifications = NotificationManager<MemoryStore, TokioTimeProvider>;
pub type SavedSearches = SavedSearchManager<MemoryStore, TokioTimeProvider>;
pub type Notifier = NotificationService<MemoryStore, TokioTimeProvider, ConnectionRegistry>;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub auth: AuthState,
    pub store: MemoryStore,
    pub registry: ConnectionRegistry,
    pub saved_searches: SavedSearches,
    pub notifications: Notifications,
    pub notifier: Notifier,
    pub fan_out: FanOutQueue,
    pub fan_out_worker: Arc<FanOutWorkerHandle>,
}

impl AppState {
    /// Opens the store and starts the fan-out worker. Must run inside a Tokio
    /// runtime.
    pub fn build(config: AppConfig) -> Result<Self, StartupError> {
        let auth = AuthState::from_config(&config)?;
        let store = match config.data_file.as_deref() {
            Some(path) => MemoryStore::open(path)?,
            None => MemoryStore::new(),
        };
        let registry = ConnectionRegistry::new();
        let saved_searches = SavedSearchManager::new(store.clone(), TokioTimeProvider);
        let notifications = NotificationManager::new(store.clone(), TokioTimeProvider);
        let notifier = NotificationService::new(notifications.clone(), registry.clone());
        let (fan_out, worker) = alerts::spawn_fan_out_worker(
            FanOut::new(notifier.clone(), store.clone()),
            config.fanout_queue_capacity,
        );

        Ok(Self {
            config,
            auth,
            store,
            registry,
            saved_searches,
            notifications,
            notifier,
            fan_out,
            fan_out_worker: Arc::new(worker),
        })
    }
}
