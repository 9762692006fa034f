use crate::types::UserId;
use crate::types::listing::Listing;
use crate::types::notification::{
    BODY_MAX_CHARS, NotificationKind, NotificationPayload, TITLE_MAX_CHARS,
};
use crate::types::saved_search::SavedSearch;

use uuid::Uuid;

/// A notification that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub recipient: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub payload: NotificationPayload,
}

impl NotificationDraft {
    fn new(
        recipient: &str,
        kind: NotificationKind,
        title: &str,
        body: String,
        payload: NotificationPayload,
    ) -> Self {
        Self {
            recipient: recipient.to_string(),
            kind,
            title: truncate_chars(title, TITLE_MAX_CHARS),
            body: truncate_chars(&body, BODY_MAX_CHARS),
            payload,
        }
    }

    pub fn listing_match(listing: &Listing, saved_search: &SavedSearch) -> Self {
        let district = if listing.district.trim().is_empty() {
            "your area"
        } else {
            listing.district.trim()
        };
        Self::new(
            &saved_search.owner_user_id,
            NotificationKind::ListingMatch,
            "New listing matches your search",
            format!(
                "\"{}\" is listed at {} EGP in {}",
                listing.title, listing.price, district
            ),
            NotificationPayload {
                listing_id: Some(listing.id),
                saved_search_id: Some(saved_search.id),
                link: Some(listing.link()),
                ..Default::default()
            },
        )
    }

    pub fn listing_approved(listing: &Listing) -> Self {
        Self::new(
            &listing.owner_user_id,
            NotificationKind::ListingApproved,
            "Your listing was approved",
            format!("\"{}\" is now visible to everyone", listing.title),
            NotificationPayload {
                listing_id: Some(listing.id),
                link: Some(listing.link()),
                ..Default::default()
            },
        )
    }

    pub fn listing_rejected(listing: &Listing, reason: Option<&str>) -> Self {
        let mut body = format!("\"{}\" was rejected.", listing.title);
        if let Some(reason) = reason.map(str::trim).filter(|reason| !reason.is_empty()) {
            body.push(' ');
            body.push_str(reason);
        }
        Self::new(
            &listing.owner_user_id,
            NotificationKind::ListingRejected,
            "Your listing was rejected",
            body,
            NotificationPayload {
                listing_id: Some(listing.id),
                link: Some("/dashboard".to_string()),
                ..Default::default()
            },
        )
    }

    pub fn new_message(
        recipient: &str,
        sender_id: &str,
        sender_name: &str,
        listing_title: &str,
        message_id: Uuid,
    ) -> Self {
        Self::new(
            recipient,
            NotificationKind::Message,
            "New message",
            format!("{sender_name} sent you a message about \"{listing_title}\""),
            NotificationPayload {
                message_id: Some(message_id),
                sender_id: Some(sender_id.to_string()),
                link: Some("/messages".to_string()),
                ..Default::default()
            },
        )
    }

    pub fn new_review(listing: &Listing, reviewer_name: &str) -> Self {
        Self::new(
            &listing.owner_user_id,
            NotificationKind::Review,
            "New review",
            format!("{reviewer_name} reviewed your listing \"{}\"", listing.title),
            NotificationPayload {
                listing_id: Some(listing.id),
                link: Some(listing.link()),
                ..Default::default()
            },
        )
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((end, _)) => value[..end].to_string(),
        None => value.to_string(),
    }
}
