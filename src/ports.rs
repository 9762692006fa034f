//! Seams between the alerting core and the outside world. Everything the
//! core touches (stores, the clock, the real-time channel) goes through a
//! trait here so tests can substitute doubles.

pub mod delivery;
pub mod store;
pub mod time;

pub use delivery::DeliveryChannel;
pub use store::{ListingStore, NotificationStore, SavedSearchStore};
pub use time::TimeProvider;
