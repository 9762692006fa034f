//! In-process document store backing every store port. Records live behind a
//! single async mutex. When a snapshot path is configured every mutation is
//! applied to a staged copy, written out as JSON, and only then committed, so a
//! failed write leaves the records untouched.

use crate::error::StoreError;
use crate::ports::store::{
    ListingStore, NotificationSlice, NotificationStore, SavedSearchStore, StatusChange, StoreFut,
};
use crate::types::listing::{Listing, ListingStatus};
use crate::types::notification::Notification;
use crate::types::saved_search::SavedSearch;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Records {
    #[serde(default)]
    listings: Vec<Listing>,
    #[serde(default)]
    saved_searches: Vec<SavedSearch>,
    #[serde(default)]
    notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<Records>>,
    snapshot: Option<Arc<PathBuf>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a store persisted at `path`, starting empty when the file does
    /// not exist yet.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let records = match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Records::default(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            records: Arc::new(Mutex::new(records)),
            snapshot: Some(Arc::new(path.to_path_buf())),
        })
    }

    /// Runs `apply` and commits its changes. With a snapshot configured the
    /// changes land in memory only after the snapshot write succeeded.
    async fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut Records) -> (T, bool),
    ) -> Result<T, StoreError> {
        let mut records = self.records.lock().await;
        let Some(path) = self.snapshot.clone() else {
            let (value, _) = apply(&mut *records);
            return Ok(value);
        };

        let mut staged = (*records).clone();
        let (value, changed) = apply(&mut staged);
        if changed {
            let contents = serde_json::to_vec_pretty(&staged)?;
            tokio::task::spawn_blocking(move || write_snapshot(&path, &contents))
                .await
                .map_err(|err| StoreError::Unavailable(format!("snapshot writer failed: {err}")))??;
            *records = staged;
        }
        Ok(value)
    }

    async fn read<T>(&self, view: impl FnOnce(&Records) -> T) -> Result<T, StoreError> {
        let records = self.records.lock().await;
        Ok(view(&*records))
    }
}

fn write_snapshot(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn newest_first<'a, T>(
    items: impl DoubleEndedIterator<Item = &'a T>,
    created_at: impl Fn(&T) -> OffsetDateTime,
) -> Vec<&'a T>
where
    T: 'a,
{
    // Reverse first so that, among equal timestamps, later inserts come first.
    let mut items: Vec<&T> = items.rev().collect();
    items.sort_by_key(|item| std::cmp::Reverse(created_at(*item)));
    items
}

impl NotificationStore for MemoryStore {
    fn insert<'a>(&'a self, notification: Notification) -> StoreFut<'a, ()> {
        Box::pin(async move {
            self.mutate(|records| {
                records.notifications.push(notification);
                ((), true)
            })
            .await
        })
    }

    fn list_for_user<'a>(
        &'a self,
        user_id: &'a str,
        unread_only: bool,
        offset: usize,
        limit: usize,
    ) -> StoreFut<'a, NotificationSlice> {
        Box::pin(async move {
            self.read(|records| {
                let matching = newest_first(
                    records.notifications.iter().filter(|notification| {
                        notification.recipient_user_id == user_id
                            && (!unread_only || !notification.is_read())
                    }),
                    |notification| notification.created_at,
                );
                let total = matching.len();
                let items = matching
                    .into_iter()
                    .skip(offset)
                    .take(limit)
                    .cloned()
                    .collect();
                NotificationSlice { items, total }
            })
            .await
        })
    }

    fn unread_count<'a>(&'a self, user_id: &'a str) -> StoreFut<'a, usize> {
        Box::pin(async move {
            self.read(|records| {
                records
                    .notifications
                    .iter()
                    .filter(|notification| {
                        notification.recipient_user_id == user_id && !notification.is_read()
                    })
                    .count()
            })
            .await
        })
    }

    fn mark_read<'a>(
        &'a self,
        id: Uuid,
        user_id: &'a str,
        now: OffsetDateTime,
    ) -> StoreFut<'a, Option<Notification>> {
        Box::pin(async move {
            self.mutate(|records| {
                let found = records.notifications.iter_mut().find(|notification| {
                    notification.id == id && notification.recipient_user_id == user_id
                });
                match found {
                    Some(notification) => {
                        let changed = notification.mark_read(now);
                        (Some(notification.clone()), changed)
                    }
                    None => (None, false),
                }
            })
            .await
        })
    }

    fn mark_all_read<'a>(&'a self, user_id: &'a str, now: OffsetDateTime) -> StoreFut<'a, usize> {
        Box::pin(async move {
            self.mutate(|records| {
                let updated = records
                    .notifications
                    .iter_mut()
                    .filter(|notification| notification.recipient_user_id == user_id)
                    .map(|notification| notification.mark_read(now))
                    .filter(|changed| *changed)
                    .count();
                (updated, updated > 0)
            })
            .await
        })
    }

    fn delete<'a>(&'a self, id: Uuid, user_id: &'a str) -> StoreFut<'a, bool> {
        Box::pin(async move {
            self.mutate(|records| {
                let before = records.notifications.len();
                records.notifications.retain(|notification| {
                    !(notification.id == id && notification.recipient_user_id == user_id)
                });
                let removed = records.notifications.len() != before;
                (removed, removed)
            })
            .await
        })
    }

    fn delete_all<'a>(&'a self, user_id: &'a str) -> StoreFut<'a, usize> {
        Box::pin(async move {
            self.mutate(|records| {
                let before = records.notifications.len();
                records
                    .notifications
                    .retain(|notification| notification.recipient_user_id != user_id);
                let removed = before - records.notifications.len();
                (removed, removed > 0)
            })
            .await
        })
    }

    fn purge_read_before<'a>(&'a self, cutoff: OffsetDateTime) -> StoreFut<'a, usize> {
        Box::pin(async move {
            self.mutate(|records| {
                let before = records.notifications.len();
                records
                    .notifications
                    .retain(|notification| !notification.is_purgeable(cutoff));
                let removed = before - records.notifications.len();
                (removed, removed > 0)
            })
            .await
        })
    }
}

impl SavedSearchStore for MemoryStore {
    fn insert<'a>(&'a self, saved_search: SavedSearch) -> StoreFut<'a, ()> {
        Box::pin(async move {
            self.mutate(|records| {
                records.saved_searches.push(saved_search);
                ((), true)
            })
            .await
        })
    }

    fn get<'a>(&'a self, id: Uuid) -> StoreFut<'a, Option<SavedSearch>> {
        Box::pin(async move {
            self.read(|records| {
                records
                    .saved_searches
                    .iter()
                    .find(|saved_search| saved_search.id == id)
                    .cloned()
            })
            .await
        })
    }

    fn list_for_owner<'a>(&'a self, owner_user_id: &'a str) -> StoreFut<'a, Vec<SavedSearch>> {
        Box::pin(async move {
            self.read(|records| {
                newest_first(
                    records
                        .saved_searches
                        .iter()
                        .filter(|saved_search| saved_search.owner_user_id == owner_user_id),
                    |saved_search| saved_search.created_at,
                )
                .into_iter()
                .cloned()
                .collect()
            })
            .await
        })
    }

    fn list_alerting<'a>(&'a self) -> StoreFut<'a, Vec<SavedSearch>> {
        Box::pin(async move {
            self.read(|records| {
                records
                    .saved_searches
                    .iter()
                    .filter(|saved_search| saved_search.alerts_enabled)
                    .cloned()
                    .collect()
            })
            .await
        })
    }

    fn delete<'a>(&'a self, id: Uuid) -> StoreFut<'a, bool> {
        Box::pin(async move {
            self.mutate(|records| {
                let before = records.saved_searches.len();
                records.saved_searches.retain(|saved_search| saved_search.id != id);
                let removed = records.saved_searches.len() != before;
                (removed, removed)
            })
            .await
        })
    }
}

impl ListingStore for MemoryStore {
    fn insert<'a>(&'a self, listing: Listing) -> StoreFut<'a, ()> {
        Box::pin(async move {
            self.mutate(|records| {
                records.listings.push(listing);
                ((), true)
            })
            .await
        })
    }

    fn get<'a>(&'a self, id: Uuid) -> StoreFut<'a, Option<Listing>> {
        Box::pin(async move {
            self.read(|records| {
                records
                    .listings
                    .iter()
                    .find(|listing| listing.id == id)
                    .cloned()
            })
            .await
        })
    }

    fn update_status<'a>(
        &'a self,
        id: Uuid,
        status: ListingStatus,
    ) -> StoreFut<'a, Option<StatusChange>> {
        Box::pin(async move {
            self.mutate(|records| {
                match records.listings.iter_mut().find(|listing| listing.id == id) {
                    Some(listing) => {
                        let previous = listing.status;
                        listing.status = status;
                        let change = StatusChange {
                            previous,
                            listing: listing.clone(),
                        };
                        (Some(change), previous != status)
                    }
                    None => (None, false),
                }
            })
            .await
        })
    }
}
