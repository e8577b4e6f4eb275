//! Playing/stopped notifications
//!
//! One boolean channel, `SONG_IS_PLAYING`. Listeners are independent:
//! adding or removing one never touches transport state, and delivery
//! order between listeners is unspecified.

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use tracing::trace;
use uuid::Uuid;

/// Name of the playing/stopped event channel
pub const SONG_IS_PLAYING: &str = "SONG_IS_PLAYING";

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

type Handler = Arc<dyn Fn(bool) + Send + Sync>;

enum Listener {
    Callback(Handler),
    Channel(Sender<bool>),
}

/// Publish/subscribe hub for `SONG_IS_PLAYING`
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<RwLock<HashMap<SubscriptionId, Listener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked with every playing/stopped transition
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.listeners
            .write()
            .insert(id, Listener::Callback(Arc::new(handler)));
        id
    }

    /// Register a channel receiving every playing/stopped transition
    pub fn subscribe_channel(&self) -> (SubscriptionId, Receiver<bool>) {
        let (tx, rx) = unbounded();
        let id = SubscriptionId::new();
        self.listeners.write().insert(id, Listener::Channel(tx));
        (id, rx)
    }

    /// Remove a listener; returns whether it was registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.write().remove(&id).is_some()
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Deliver `is_playing` to every listener
    ///
    /// Callbacks run outside the registry lock, so a handler may itself
    /// subscribe or unsubscribe. Channels whose receiver is gone are pruned.
    pub fn publish(&self, is_playing: bool) {
        trace!(event = SONG_IS_PLAYING, is_playing, "publishing");

        let mut handlers = Vec::new();
        let mut closed = Vec::new();
        {
            let listeners = self.listeners.read();
            for (id, listener) in listeners.iter() {
                match listener {
                    Listener::Callback(handler) => handlers.push(Arc::clone(handler)),
                    Listener::Channel(tx) => {
                        if tx.send(is_playing).is_err() {
                            closed.push(*id);
                        }
                    }
                }
            }
        }

        if !closed.is_empty() {
            let mut listeners = self.listeners.write();
            for id in closed {
                listeners.remove(&id);
            }
        }

        for handler in handlers {
            handler(is_playing);
        }
    }
}
