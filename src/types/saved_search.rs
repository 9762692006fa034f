use crate::types::UserId;
use crate::types::listing::ListingType;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_SAVED_SEARCH_TITLE: &str = "Saved search";

/// Filters stored with a saved search. Absent fields do not constrain a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    /// Exact listing type (`sell` or `rent`).
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<ListingType>,
    /// Matched case-insensitively as a substring in either direction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    /// Inclusive lower price bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<u64>,
    /// Inclusive upper price bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<u64>,
    #[serde(default, alias = "bedrooms", skip_serializing_if = "Option::is_none")]
    pub min_bedrooms: Option<u32>,
    /// Only `Some(true)` constrains.
    #[serde(default, alias = "furnished", skip_serializing_if = "Option::is_none")]
    pub furnished_required: Option<bool>,
    /// Only `Some(true)` constrains.
    #[serde(default, alias = "nearCampus", skip_serializing_if = "Option::is_none")]
    pub near_campus_required: Option<bool>,
}

impl SearchCriteria {
    /// Normalizes blank strings away and rejects contradictory bounds.
    pub fn validated(mut self) -> Result<Self, String> {
        if let Some(district) = self.district.as_deref() {
            let trimmed = district.trim();
            self.district = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            return Err(format!("minPrice ({min}) must not exceed maxPrice ({max})"));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSearch {
    pub id: Uuid,
    pub owner_user_id: UserId,
    pub title: String,
    pub criteria: SearchCriteria,
    pub alerts_enabled: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
