use std::hash::{Hash, Hasher};

use viewport_protocol::{ListenerId, ObserverId};

use crate::options::ObservationOptions;

/// Join record binding one observer to the platform listener serving it.
///
/// Identity is `(listener_id, observer_id)`. The options are the ones the
/// listener was created or matched with and take no part in equality; they
/// stay frozen for the lifetime of the subscription.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub listener_id: ListenerId,
    pub observer_id: ObserverId,
    pub options: Option<ObservationOptions>,
}

impl Subscription {
    pub fn new(
        listener_id: ListenerId,
        observer_id: ObserverId,
        options: Option<ObservationOptions>,
    ) -> Self {
        Self {
            listener_id,
            observer_id,
            options,
        }
    }
}

impl PartialEq for Subscription {
    fn eq(&self, other: &Self) -> bool {
        self.listener_id == other.listener_id && self.observer_id == other.observer_id
    }
}

impl Eq for Subscription {}

impl Hash for Subscription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.listener_id.hash(state);
        self.observer_id.hash(state);
    }
}
