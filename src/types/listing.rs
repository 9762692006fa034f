use crate::types::UserId;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Sell,
    Rent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    Pending,
    Sold,
    Rented,
    Inactive,
}

impl ListingStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "active" => Some(Self::Active),
            "pending" => Some(Self::Pending),
            "sold" => Some(Self::Sold),
            "rented" => Some(Self::Rented),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Sold => "sold",
            Self::Rented => "rented",
            Self::Inactive => "inactive",
        }
    }
}

/// The slice of a marketplace listing that alerting cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Uuid,
    pub owner_user_id: UserId,
    pub listing_type: ListingType,
    pub title: String,
    pub price: u64,
    pub bedroom_count: u32,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub furnished: bool,
    #[serde(default)]
    pub near_campus: bool,
    pub status: ListingStatus,
}

impl Listing {
    pub fn link(&self) -> String {
        format!("/listings/{}", self.id)
    }
}
