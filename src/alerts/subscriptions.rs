use crate::error::AppError;
use crate::ports::{SavedSearchStore, TimeProvider};
use crate::types::saved_search::{DEFAULT_SAVED_SEARCH_TITLE, SavedSearch, SearchCriteria};

use uuid::Uuid;

pub const TITLE_MAX_CHARS: usize = 120;

/// Owns saved-search lifecycle on behalf of their owners. Timestamps come
/// from the injected clock.
#[derive(Debug, Clone)]
pub struct SavedSearchManager<S, T> {
    store: S,
    time: T,
}

impl<S, T> SavedSearchManager<S, T>
where
    S: SavedSearchStore,
    T: TimeProvider,
{
    pub fn new(store: S, time: T) -> Self {
        Self { store, time }
    }

    /// A blank title falls back to the default; alerts are on unless turned
    /// off explicitly.
    pub async fn create(
        &self,
        owner_user_id: &str,
        title: Option<&str>,
        criteria: SearchCriteria,
        alerts_enabled: Option<bool>,
    ) -> Result<SavedSearch, AppError> {
        let owner_user_id = owner_user_id.trim();
        if owner_user_id.is_empty() {
            return Err(AppError::Validation("owner is required".to_string()));
        }
        let criteria = criteria.validated().map_err(AppError::Validation)?;
        let title = match title.map(str::trim) {
            Some(title) if title.chars().count() > TITLE_MAX_CHARS => {
                return Err(AppError::Validation(format!(
                    "title must be at most {TITLE_MAX_CHARS} characters"
                )));
            }
            Some(title) if !title.is_empty() => title.to_string(),
            _ => DEFAULT_SAVED_SEARCH_TITLE.to_string(),
        };

        let saved_search = SavedSearch {
            id: Uuid::new_v4(),
            owner_user_id: owner_user_id.to_string(),
            title,
            criteria,
            alerts_enabled: alerts_enabled.unwrap_or(true),
            created_at: self.time.now(),
        };
        self.store.insert(saved_search.clone()).await?;
        tracing::info!(
            saved_search_id = %saved_search.id,
            owner = %saved_search.owner_user_id,
            alerts = saved_search.alerts_enabled,
            "saved search created"
        );
        Ok(saved_search)
    }

    pub async fn list_for_owner(&self, owner_user_id: &str) -> Result<Vec<SavedSearch>, AppError> {
        Ok(self.store.list_for_owner(owner_user_id).await?)
    }

    /// `NotFound` when missing, `Forbidden` when owned by someone else.
    pub async fn delete(&self, id: Uuid, requester: &str) -> Result<(), AppError> {
        let saved_search = self.store.get(id).await?.ok_or(AppError::NotFound)?;
        if saved_search.owner_user_id != requester {
            return Err(AppError::Forbidden);
        }
        if !self.store.delete(id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
