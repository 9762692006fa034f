use crate::alerts::matcher;
use crate::notifications::{NotificationDraft, NotificationService};
use crate::ports;
use crate::types::listing::Listing;

use tracing::Instrument;

/// Evaluates every alerting saved search against a freshly activated listing
/// and notifies the matching users.
#[derive(Debug, Clone)]
pub struct FanOut<N, S, T, D> {
    notifier: NotificationService<N, T, D>,
    saved_searches: S,
}

impl<N, S, T, D> FanOut<N, S, T, D>
where
    N: ports::NotificationStore,
    S: ports::SavedSearchStore,
    T: ports::TimeProvider,
    D: ports::DeliveryChannel,
{
    pub fn new(notifier: NotificationService<N, T, D>, saved_searches: S) -> Self {
        Self {
            notifier,
            saved_searches,
        }
    }

    /// Returns the number of notifications created. Store outages and
    /// per-subscriber failures are logged, never returned.
    pub async fn on_listing_activated(&self, listing: &Listing) -> usize {
        let span = tracing::info_span!("fan_out", listing_id = %listing.id);
        self.run(listing).instrument(span).await
    }

    async fn run(&self, listing: &Listing) -> usize {
        let saved_searches = match self.saved_searches.list_alerting().await {
            Ok(saved_searches) => saved_searches,
            Err(err) => {
                tracing::error!(error = %err, "failed to load saved searches");
                return 0;
            }
        };

        let mut notified = 0;
        for saved_search in &saved_searches {
            if saved_search.owner_user_id == listing.owner_user_id {
                continue;
            }
            if !matcher::matches(listing, &saved_search.criteria) {
                continue;
            }

            let draft = NotificationDraft::listing_match(listing, saved_search);
            match self.notifier.notify(draft).await {
                Ok(_) => notified += 1,
                Err(err) => tracing::warn!(
                    saved_search_id = %saved_search.id,
                    recipient = %saved_search.owner_user_id,
                    error = %err,
                    "failed to create listing match notification"
                ),
            }
        }

        tracing::info!(
            notified,
            evaluated = saved_searches.len(),
            "listing match notifications sent"
        );
        notified
    }
}
