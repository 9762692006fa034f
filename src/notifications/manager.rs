use crate::error::AppError;
use crate::ports::{NotificationStore, TimeProvider};
use crate::types::notification::{
    BODY_MAX_CHARS, Notification, NotificationKind, NotificationPayload, TITLE_MAX_CHARS,
};

use uuid::Uuid;

/// Read notifications older than this are removed by `purge_old`.
pub const RETENTION: time::Duration = time::Duration::days(30);

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub unread_only: bool,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            unread_only: false,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListQuery {
    fn normalized(self) -> Self {
        Self {
            unread_only: self.unread_only,
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationPage {
    pub items: Vec<Notification>,
    /// Size of the filtered set across all pages.
    pub total: usize,
    /// Unread notifications of the user, regardless of the filter.
    pub unread_count: usize,
    pub page: usize,
    pub page_size: usize,
}

impl NotificationPage {
    pub fn pages(&self) -> usize {
        self.total.div_ceil(self.page_size)
    }
}

/// Owns the notification lifecycle. Creation only persists; real-time
/// delivery is layered on top by `NotificationService`.
#[derive(Debug, Clone)]
pub struct NotificationManager<S, T> {
    store: S,
    time: T,
}

impl<S, T> NotificationManager<S, T>
where
    S: NotificationStore,
    T: TimeProvider,
{
    pub fn new(store: S, time: T) -> Self {
        Self { store, time }
    }

    pub async fn create(
        &self,
        recipient_user_id: &str,
        kind: NotificationKind,
        title: &str,
        body: &str,
        payload: NotificationPayload,
    ) -> Result<Notification, AppError> {
        let recipient_user_id = recipient_user_id.trim();
        if recipient_user_id.is_empty() {
            return Err(AppError::Validation("recipient is required".to_string()));
        }
        let title = validated_text("title", title, TITLE_MAX_CHARS)?;
        let body = validated_text("body", body, BODY_MAX_CHARS)?;

        let notification = Notification::new(
            recipient_user_id.to_string(),
            kind,
            title,
            body,
            payload,
            self.time.now(),
        );
        self.store.insert(notification.clone()).await?;
        Ok(notification)
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
        query: ListQuery,
    ) -> Result<NotificationPage, AppError> {
        let query = query.normalized();
        let offset = (query.page - 1).saturating_mul(query.page_size);
        let slice = self
            .store
            .list_for_user(user_id, query.unread_only, offset, query.page_size)
            .await?;
        let unread_count = self.store.unread_count(user_id).await?;
        Ok(NotificationPage {
            items: slice.items,
            total: slice.total,
            unread_count,
            page: query.page,
            page_size: query.page_size,
        })
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<usize, AppError> {
        Ok(self.store.unread_count(user_id).await?)
    }

    /// Marking an already-read notification is a successful no-op.
    pub async fn mark_read(&self, id: Uuid, user_id: &str) -> Result<Notification, AppError> {
        self.store
            .mark_read(id, user_id, self.time.now())
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn mark_all_read(&self, user_id: &str) -> Result<usize, AppError> {
        Ok(self.store.mark_all_read(user_id, self.time.now()).await?)
    }

    /// Missing and foreign notifications both report `NotFound`.
    pub async fn delete(&self, id: Uuid, user_id: &str) -> Result<(), AppError> {
        if self.store.delete(id, user_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }

    pub async fn delete_all(&self, user_id: &str) -> Result<usize, AppError> {
        Ok(self.store.delete_all(user_id).await?)
    }

    pub async fn purge_old(&self) -> Result<usize, AppError> {
        let cutoff = self.time.now() - RETENTION;
        Ok(self.store.purge_read_before(cutoff).await?)
    }
}

fn validated_text(field: &str, value: &str, max_chars: usize) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > max_chars {
        return Err(AppError::Validation(format!(
            "{field} cannot exceed {max_chars} characters"
        )));
    }
    Ok(value.to_string())
}

#[cfg(test)]
#[allow(non_snake_case)]
pub(crate) mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    /// Clock that only moves when told to; sleeps resolve immediately.
    #[derive(Clone)]
    pub(crate) struct FixedTime {
        now: Arc<Mutex<OffsetDateTime>>,
    }

    impl FixedTime {
        pub(crate) fn new(now: OffsetDateTime) -> Self {
            Self {
                now: Arc::new(Mutex::new(now)),
            }
        }

        pub(crate) fn advance(&self, by: time::Duration) {
            let mut now = self.now.lock().expect("now lock");
            *now += by;
        }
    }

    impl TimeProvider for FixedTime {
        type Sleep<'a>
            = std::future::Ready<()>
        where
            Self: 'a;

        fn now(&self) -> OffsetDateTime {
            *self.now.lock().expect("now lock")
        }

        fn sleep<'a>(&'a self, _duration: Duration) -> Self::Sleep<'a> {
            std::future::ready(())
        }
    }

    pub(crate) fn start_time() -> OffsetDateTime {
        OffsetDateTime::parse("2025-01-12T09:30:00Z", &Rfc3339).expect("parse time")
    }

    fn manager() -> (NotificationManager<MemoryStore, FixedTime>, FixedTime) {
        let time = FixedTime::new(start_time());
        (
            NotificationManager::new(MemoryStore::new(), time.clone()),
            time,
        )
    }

    async fn create_system(
        manager: &NotificationManager<MemoryStore, FixedTime>,
        user: &str,
    ) -> Notification {
        manager
            .create(
                user,
                NotificationKind::System,
                "Welcome",
                "Hello there",
                NotificationPayload::default(),
            )
            .await
            .expect("create notification")
    }

    #[tokio::test]
    async fn create__should_reject_blank_or_oversized_text() {
        // Given
        let (manager, _) = manager();
        let long_title = "x".repeat(TITLE_MAX_CHARS + 1);

        // When
        let blank = manager
            .create(
                "student-1",
                NotificationKind::System,
                "  ",
                "body",
                NotificationPayload::default(),
            )
            .await;
        let oversized = manager
            .create(
                "student-1",
                NotificationKind::System,
                &long_title,
                "body",
                NotificationPayload::default(),
            )
            .await;

        // Then
        assert!(matches!(blank, Err(AppError::Validation(_))));
        assert!(matches!(oversized, Err(AppError::Validation(_))));
        assert_eq!(manager.unread_count("student-1").await.expect("count"), 0);
    }

    #[tokio::test]
    async fn mark_read__should_be_idempotent() {
        // Given
        let (manager, time) = manager();
        let created = create_system(&manager, "student-1").await;
        let first = manager
            .mark_read(created.id, "student-1")
            .await
            .expect("first mark");

        // When
        time.advance(time::Duration::hours(1));
        let second = manager
            .mark_read(created.id, "student-1")
            .await
            .expect("second mark");

        // Then
        assert!(second.is_read());
        assert_eq!(second.read_at(), first.read_at());
        assert_eq!(second.read_at(), Some(start_time()));
    }

    #[tokio::test]
    async fn mark_read__should_hide_foreign_notifications() {
        // Given
        let (manager, _) = manager();
        let created = create_system(&manager, "student-1").await;

        // When
        let result = manager.mark_read(created.id, "student-2").await;

        // Then
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn mark_all_read__should_keep_existing_read_timestamps() {
        // Given
        let (manager, time) = manager();
        let mut already_read = Vec::new();
        for _ in 0..3 {
            let created = create_system(&manager, "student-1").await;
            let read = manager
                .mark_read(created.id, "student-1")
                .await
                .expect("mark read");
            already_read.push(read);
        }
        for _ in 0..5 {
            create_system(&manager, "student-1").await;
        }
        time.advance(time::Duration::hours(2));

        // When
        let updated = manager.mark_all_read("student-1").await.expect("mark all");

        // Then
        assert_eq!(updated, 5);
        assert_eq!(manager.unread_count("student-1").await.expect("count"), 0);
        let page = manager
            .list_for_user("student-1", ListQuery::default())
            .await
            .expect("list");
        assert_eq!(page.total, 8);
        assert!(page.items.iter().all(Notification::is_read));
        for read in already_read {
            let current = page
                .items
                .iter()
                .find(|item| item.id == read.id)
                .expect("still present");
            assert_eq!(current.read_at(), Some(start_time()));
        }
        let newly_read = page
            .items
            .iter()
            .filter(|item| item.read_at() == Some(start_time() + time::Duration::hours(2)))
            .count();
        assert_eq!(newly_read, 5);
    }

    #[tokio::test]
    async fn list_for_user__should_filter_unread_and_report_counts() {
        // Given
        let (manager, time) = manager();
        let first = create_system(&manager, "student-1").await;
        time.advance(time::Duration::minutes(1));
        let second = create_system(&manager, "student-1").await;
        create_system(&manager, "student-2").await;
        manager
            .mark_read(first.id, "student-1")
            .await
            .expect("mark read");

        // When
        let unread = manager
            .list_for_user(
                "student-1",
                ListQuery {
                    unread_only: true,
                    ..Default::default()
                },
            )
            .await
            .expect("list unread");
        let all = manager
            .list_for_user("student-1", ListQuery::default())
            .await
            .expect("list all");

        // Then
        assert_eq!(unread.total, 1);
        assert_eq!(unread.items[0].id, second.id);
        assert_eq!(all.total, 2);
        assert_eq!(all.unread_count, 1);
        assert_eq!(all.items[0].id, second.id);
        assert_eq!(all.pages(), 1);
    }

    #[tokio::test]
    async fn delete__should_only_remove_own_notifications() {
        // Given
        let (manager, _) = manager();
        let created = create_system(&manager, "student-1").await;

        // When
        let foreign = manager.delete(created.id, "student-2").await;
        let own = manager.delete(created.id, "student-1").await;
        let again = manager.delete(created.id, "student-1").await;

        // Then
        assert!(matches!(foreign, Err(AppError::NotFound)));
        assert!(own.is_ok());
        assert!(matches!(again, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn delete_all__should_scope_to_user() {
        // Given
        let (manager, _) = manager();
        create_system(&manager, "student-1").await;
        create_system(&manager, "student-1").await;
        create_system(&manager, "student-2").await;

        // When
        let removed = manager.delete_all("student-1").await.expect("delete all");

        // Then
        assert_eq!(removed, 2);
        assert_eq!(manager.unread_count("student-2").await.expect("count"), 1);
    }

    #[tokio::test]
    async fn purge_old__should_remove_only_old_read_notifications() {
        // Given
        let (manager, time) = manager();
        let old_read = create_system(&manager, "student-1").await;
        manager
            .mark_read(old_read.id, "student-1")
            .await
            .expect("mark read");
        let old_unread = create_system(&manager, "student-1").await;
        time.advance(time::Duration::days(20));
        let recent_read = create_system(&manager, "student-1").await;
        manager
            .mark_read(recent_read.id, "student-1")
            .await
            .expect("mark read");
        time.advance(time::Duration::days(11));

        // When
        let purged = manager.purge_old().await.expect("purge");

        // Then
        assert_eq!(purged, 1);
        let remaining: Vec<Uuid> = manager
            .list_for_user("student-1", ListQuery::default())
            .await
            .expect("list")
            .items
            .into_iter()
            .map(|item| item.id)
            .collect();
        assert!(!remaining.contains(&old_read.id));
        assert!(remaining.contains(&old_unread.id));
        assert!(remaining.contains(&recent_read.id));
    }
}
