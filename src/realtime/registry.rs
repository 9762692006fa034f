use crate::error::DeliveryError;
use crate::ports::DeliveryChannel;
use crate::types::UserId;

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

pub type ConnectionId = u64;

/// Frames a connection may have queued before it counts as stalled and is
/// dropped.
pub const OUTBOUND_CAPACITY: usize = 64;

/// Outbound frames for one connection, already serialized.
pub type Outbound = mpsc::Receiver<String>;

#[derive(Debug, Default)]
struct Inner {
    next_id: ConnectionId,
    connecting: HashMap<ConnectionId, mpsc::Sender<String>>,
    by_user: HashMap<UserId, HashMap<ConnectionId, mpsc::Sender<String>>>,
    by_connection: HashMap<ConnectionId, UserId>,
}

impl Inner {
    fn detach(&mut self, connection: ConnectionId) -> Option<mpsc::Sender<String>> {
        if let Some(sender) = self.connecting.remove(&connection) {
            return Some(sender);
        }
        let user_id = self.by_connection.remove(&connection)?;
        let connections = self.by_user.get_mut(&user_id)?;
        let sender = connections.remove(&connection);
        if connections.is_empty() {
            self.by_user.remove(&user_id);
        }
        sender
    }
}

/// Registry of live connections keyed by user. Join, leave and emit all take
/// the same lock, so an emit never races a teardown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Serialize)]
struct Envelope<'a, P: ?Sized> {
    event: &'a str,
    data: &'a P,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocates a connection that is not yet addressable by any user.
    pub fn connect(&self) -> (ConnectionId, Outbound) {
        let (sender, receiver) = mpsc::channel(OUTBOUND_CAPACITY);
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.connecting.insert(id, sender);
        (id, receiver)
    }

    /// Makes `connection` addressable as `user_id`. Joining again under a
    /// different user moves the connection. Returns `false` for a connection
    /// that already left.
    pub fn join(&self, user_id: &str, connection: ConnectionId) -> bool {
        let mut inner = self.lock();
        let Some(sender) = inner.detach(connection) else {
            return false;
        };
        inner
            .by_user
            .entry(user_id.to_string())
            .or_default()
            .insert(connection, sender);
        inner.by_connection.insert(connection, user_id.to_string());
        true
    }

    pub fn leave(&self, connection: ConnectionId) {
        let mut inner = self.lock();
        inner.detach(connection);
    }

    pub fn connection_count(&self, user_id: &str) -> usize {
        self.lock()
            .by_user
            .get(user_id)
            .map(HashMap::len)
            .unwrap_or(0)
    }
}

impl DeliveryChannel for ConnectionRegistry {
    fn emit<P>(&self, user_id: &str, event: &str, payload: &P) -> Result<usize, DeliveryError>
    where
        P: Serialize + ?Sized,
    {
        let frame = serde_json::to_string(&Envelope {
            event,
            data: payload,
        })?;

        let mut inner = self.lock();
        let Some(connections) = inner.by_user.get(user_id) else {
            return Ok(0);
        };

        // Closed and stalled connections are both pruned.
        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, sender) in connections {
            match sender.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => closed.push(*id),
            }
        }

        let attempted = delivered + closed.len();
        for id in closed {
            inner.detach(id);
        }
        if delivered == 0 && attempted > 0 {
            return Err(DeliveryError::Transport(attempted));
        }
        Ok(delivered)
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn next_frame(outbound: &mut Outbound) -> Value {
        let frame = outbound.try_recv().expect("frame queued");
        serde_json::from_str(&frame).expect("frame is json")
    }

    #[test]
    fn emit__should_be_noop_for_offline_user() {
        // Given
        let registry = ConnectionRegistry::new();

        // When
        let delivered = registry
            .emit("student-1", "new_notification", &json!({"id": 1}))
            .expect("emit");

        // Then
        assert_eq!(delivered, 0);
    }

    #[test]
    fn emit__should_reach_every_joined_connection() {
        // Given
        let registry = ConnectionRegistry::new();
        let (phone, mut phone_rx) = registry.connect();
        let (laptop, mut laptop_rx) = registry.connect();
        let (other, mut other_rx) = registry.connect();
        registry.join("student-1", phone);
        registry.join("student-1", laptop);
        registry.join("student-2", other);

        // When
        let delivered = registry
            .emit("student-1", "new_notification", &json!({"title": "Hi"}))
            .expect("emit");

        // Then
        assert_eq!(delivered, 2);
        assert_eq!(next_frame(&mut phone_rx)["event"], "new_notification");
        assert_eq!(next_frame(&mut laptop_rx)["data"]["title"], "Hi");
        assert!(other_rx.try_recv().is_err());
    }

    #[test]
    fn emit__should_skip_connections_that_have_not_joined() {
        // Given
        let registry = ConnectionRegistry::new();
        let (_pending, mut pending_rx) = registry.connect();

        // When
        let delivered = registry
            .emit("student-1", "new_notification", &json!({}))
            .expect("emit");

        // Then
        assert_eq!(delivered, 0);
        assert!(pending_rx.try_recv().is_err());
    }

    #[test]
    fn leave__should_stop_delivery_and_rejoin_should_restore_it() {
        // Given
        let registry = ConnectionRegistry::new();
        let (first, _first_rx) = registry.connect();
        registry.join("student-1", first);

        // When
        registry.leave(first);
        let after_leave = registry
            .emit("student-1", "new_notification", &json!({}))
            .expect("emit");
        let (second, mut second_rx) = registry.connect();
        registry.join("student-1", second);
        let after_rejoin = registry
            .emit("student-1", "new_notification", &json!({}))
            .expect("emit");

        // Then
        assert_eq!(after_leave, 0);
        assert_eq!(after_rejoin, 1);
        assert!(second_rx.try_recv().is_ok());
        assert!(!registry.join("student-1", first));
    }

    #[test]
    fn join__should_move_connection_between_users() {
        // Given
        let registry = ConnectionRegistry::new();
        let (connection, _rx) = registry.connect();
        registry.join("student-1", connection);

        // When
        registry.join("student-2", connection);

        // Then
        assert_eq!(registry.connection_count("student-1"), 0);
        assert_eq!(registry.connection_count("student-2"), 1);
    }

    #[test]
    fn emit__should_report_transport_failure_and_prune_closed_connections() {
        // Given
        let registry = ConnectionRegistry::new();
        let (connection, receiver) = registry.connect();
        registry.join("student-1", connection);
        drop(receiver);

        // When
        let result = registry.emit("student-1", "new_notification", &json!({}));

        // Then
        assert!(matches!(result, Err(DeliveryError::Transport(1))));
        assert_eq!(registry.connection_count("student-1"), 0);
    }

    #[test]
    fn emit__should_prune_stalled_connection_when_queue_is_full() {
        // Given
        let registry = ConnectionRegistry::new();
        let (stalled, _stalled_rx) = registry.connect();
        let (live, mut live_rx) = registry.connect();
        registry.join("student-1", stalled);
        registry.join("student-2", live);
        for _ in 0..OUTBOUND_CAPACITY {
            registry
                .emit("student-1", "new_notification", &json!({}))
                .expect("emit within capacity");
        }

        // When
        let overflow = registry.emit("student-1", "new_notification", &json!({}));
        let unaffected = registry
            .emit("student-2", "new_notification", &json!({}))
            .expect("emit");

        // Then
        assert!(matches!(overflow, Err(DeliveryError::Transport(1))));
        assert_eq!(registry.connection_count("student-1"), 0);
        assert_eq!(unaffected, 1);
        assert!(live_rx.try_recv().is_ok());
    }
}
