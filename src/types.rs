pub mod listing;
pub mod notification;
pub mod saved_search;

/// Identity of an authenticated user, as carried in the token subject.
pub type UserId = String;
