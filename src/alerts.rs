//! Saved-search alerting: matching new listings against stored criteria and
//! fanning out notifications to the users whose searches match.

pub mod fanout;
pub mod matcher;
pub mod subscriptions;
pub mod worker;

pub use fanout::FanOut;
pub use matcher::matches;
pub use subscriptions::SavedSearchManager;
pub use worker::{FanOutQueue, FanOutWorkerHandle, QueueError, spawn_fan_out_worker};
