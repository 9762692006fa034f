use crate::error::StoreError;
use crate::types::listing::{Listing, ListingStatus};
use crate::types::notification::Notification;
use crate::types::saved_search::SavedSearch;

use std::pin::Pin;

use time::OffsetDateTime;
use uuid::Uuid;

pub type StoreFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// One page of a user's notifications, newest first, together with the size
/// of the filtered set.
#[derive(Debug, Clone)]
pub struct NotificationSlice {
    pub items: Vec<Notification>,
    pub total: usize,
}

pub trait NotificationStore: Clone + Send + Sync + 'static {
    fn insert<'a>(&'a self, notification: Notification) -> StoreFut<'a, ()>;

    fn list_for_user<'a>(
        &'a self,
        user_id: &'a str,
        unread_only: bool,
        offset: usize,
        limit: usize,
    ) -> StoreFut<'a, NotificationSlice>;

    fn unread_count<'a>(&'a self, user_id: &'a str) -> StoreFut<'a, usize>;

    /// `None` when the notification is missing or belongs to someone else.
    fn mark_read<'a>(
        &'a self,
        id: Uuid,
        user_id: &'a str,
        now: OffsetDateTime,
    ) -> StoreFut<'a, Option<Notification>>;

    fn mark_all_read<'a>(&'a self, user_id: &'a str, now: OffsetDateTime) -> StoreFut<'a, usize>;

    /// `false` when the notification is missing or belongs to someone else.
    fn delete<'a>(&'a self, id: Uuid, user_id: &'a str) -> StoreFut<'a, bool>;

    fn delete_all<'a>(&'a self, user_id: &'a str) -> StoreFut<'a, usize>;

    /// Removes read notifications created strictly before `cutoff`.
    fn purge_read_before<'a>(&'a self, cutoff: OffsetDateTime) -> StoreFut<'a, usize>;
}

pub trait SavedSearchStore: Clone + Send + Sync + 'static {
    fn insert<'a>(&'a self, saved_search: SavedSearch) -> StoreFut<'a, ()>;
    fn get<'a>(&'a self, id: Uuid) -> StoreFut<'a, Option<SavedSearch>>;
    /// Newest first.
    fn list_for_owner<'a>(&'a self, owner_user_id: &'a str) -> StoreFut<'a, Vec<SavedSearch>>;
    /// Every saved search with alerts enabled, across all users.
    fn list_alerting<'a>(&'a self) -> StoreFut<'a, Vec<SavedSearch>>;
    fn delete<'a>(&'a self, id: Uuid) -> StoreFut<'a, bool>;
}

/// Result of a committed status change.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub previous: ListingStatus,
    pub listing: Listing,
}

impl StatusChange {
    pub fn is_activation(&self) -> bool {
        self.listing.status == ListingStatus::Active && self.previous != ListingStatus::Active
    }
}

pub trait ListingStore: Clone + Send + Sync + 'static {
    fn insert<'a>(&'a self, listing: Listing) -> StoreFut<'a, ()>;
    fn get<'a>(&'a self, id: Uuid) -> StoreFut<'a, Option<Listing>>;
    fn update_status<'a>(
        &'a self,
        id: Uuid,
        status: ListingStatus,
    ) -> StoreFut<'a, Option<StatusChange>>;
}
