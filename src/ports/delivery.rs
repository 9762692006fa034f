use crate::error::DeliveryError;

use serde::Serialize;

/// Pushes an event to every live connection of a user.
pub trait DeliveryChannel: Clone + Send + Sync + 'static {
    /// Returns the number of connections the event reached. A user with no
    /// live connection yields `Ok(0)`.
    fn emit<P>(&self, user_id: &str, event: &str, payload: &P) -> Result<usize, DeliveryError>
    where
        P: Serialize + ?Sized;
}
