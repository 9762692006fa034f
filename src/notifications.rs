pub mod drafts;
pub mod manager;
pub mod retention;

pub use drafts::NotificationDraft;
pub use manager::{ListQuery, NotificationManager, NotificationPage};
pub use retention::{RetentionSweeper, SweeperHandle};

use crate::error::AppError;
use crate::ports::{DeliveryChannel, NotificationStore, TimeProvider};
use crate::realtime::NEW_NOTIFICATION_EVENT;
use crate::types::notification::Notification;

/// Persists a notification and then pushes it to the recipient's live
/// connections. The push is best-effort.
#[derive(Debug, Clone)]
pub struct NotificationService<S, T, D> {
    manager: NotificationManager<S, T>,
    channel: D,
}

impl<S, T, D> NotificationService<S, T, D>
where
    S: NotificationStore,
    T: TimeProvider,
    D: DeliveryChannel,
{
    pub fn new(manager: NotificationManager<S, T>, channel: D) -> Self {
        Self { manager, channel }
    }

    pub fn manager(&self) -> &NotificationManager<S, T> {
        &self.manager
    }

    pub async fn notify(&self, draft: NotificationDraft) -> Result<Notification, AppError> {
        let notification = self
            .manager
            .create(
                &draft.recipient,
                draft.kind,
                &draft.title,
                &draft.body,
                draft.payload,
            )
            .await?;

        match self.channel.emit(
            &notification.recipient_user_id,
            NEW_NOTIFICATION_EVENT,
            &notification,
        ) {
            Ok(0) => tracing::debug!(
                recipient = %notification.recipient_user_id,
                notification_id = %notification.id,
                "recipient offline, stored only"
            ),
            Ok(connections) => tracing::debug!(
                recipient = %notification.recipient_user_id,
                notification_id = %notification.id,
                connections,
                "notification pushed"
            ),
            Err(err) => tracing::warn!(
                recipient = %notification.recipient_user_id,
                notification_id = %notification.id,
                error = %err,
                "real-time delivery failed"
            ),
        }

        Ok(notification)
    }
}
