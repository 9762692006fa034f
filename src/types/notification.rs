use crate::types::UserId;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub const TITLE_MAX_CHARS: usize = 200;
pub const BODY_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Message,
    Review,
    ListingMatch,
    ListingApproved,
    ListingRejected,
    System,
}

/// Navigation data attached to a notification. Every field is optional and
/// only the ones relevant to the notification kind are filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_search_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub recipient_user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub payload: NotificationPayload,
    is_read: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    read_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Notification {
    pub fn new(
        recipient_user_id: UserId,
        kind: NotificationKind,
        title: String,
        body: String,
        payload: NotificationPayload,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_user_id,
            kind,
            title,
            body,
            payload,
            is_read: false,
            read_at: None,
            created_at,
        }
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn read_at(&self) -> Option<OffsetDateTime> {
        self.read_at
    }

    /// Returns `true` when the record changed. Already-read notifications keep
    /// their original `read_at`.
    pub fn mark_read(&mut self, now: OffsetDateTime) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        self.read_at = Some(now);
        true
    }

    pub fn is_purgeable(&self, cutoff: OffsetDateTime) -> bool {
        self.is_read && self.created_at < cutoff
    }
}
