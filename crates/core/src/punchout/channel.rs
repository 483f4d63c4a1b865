//! Page-level message channel.
//!
//! A [`MessageChannel`] stands in for the window's `message` event target:
//! any number of listeners can subscribe, every published message reaches
//! all of them, and each [`Subscription`] removes its listener when dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Listener<M> = Arc<dyn Fn(&M) + Send + Sync>;

struct ChannelInner<M> {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener<M>)>>,
}

impl<M> ChannelInner<M> {
    fn remove(&self, id: u64) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(listener_id, _)| *listener_id != id);
    }
}

/// A broadcast channel of messages shared by everything on one page.
///
/// Cloning the channel yields another handle to the same listener set.
pub struct MessageChannel<M> {
    inner: Arc<ChannelInner<M>>,
}

impl<M> Clone for MessageChannel<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M> Default for MessageChannel<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> std::fmt::Debug for MessageChannel<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageChannel")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<M> MessageChannel<M> {
    /// Create a channel with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                next_id: AtomicU64::new(0),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register a listener.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped or [`Subscription::unsubscribe`] is called.
    #[must_use = "dropping the subscription immediately removes the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription<M>
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));

        Subscription {
            id,
            channel: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver a message to every current listener.
    ///
    /// Listeners run outside the channel lock, so they may subscribe or
    /// unsubscribe. Returns the number of listeners the message reached.
    pub fn publish(&self, message: &M) -> usize {
        let listeners: Vec<Listener<M>> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in &listeners {
            listener(message);
        }
        listeners.len()
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Guard for a registered listener.
///
/// Dropping it deregisters the listener. It holds only a weak reference, so
/// it never keeps a channel alive.
pub struct Subscription<M> {
    id: u64,
    channel: Weak<ChannelInner<M>>,
}

impl<M> Subscription<M> {
    /// Deregister the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl<M> std::fmt::Debug for Subscription<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl<M> Drop for Subscription<M> {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.upgrade() {
            channel.remove(self.id);
        }
    }
}
