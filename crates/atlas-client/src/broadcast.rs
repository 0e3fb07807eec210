//! Cross-tab logout synchronization.
//!
//! Abstractly a publish/subscribe channel scoped to the browsing-context
//! group: a logout published by one tab must be observed by every other
//! same-origin tab within a bounded delay, and each observer cancels its
//! local timers on receipt.

use tokio::sync::broadcast;

/// Capacity of the logout channel. Observers that lag past this many
/// unconsumed signals still converge on the next receive.
const CHANNEL_CAPACITY: usize = 8;

/// Publish/subscribe channel for logout signals.
pub trait SessionBroadcast: Send + Sync + std::fmt::Debug + 'static {
    /// Announce a logout to every subscriber.
    fn publish_logout(&self);

    /// Subscribe to logout announcements.
    fn subscribe(&self) -> broadcast::Receiver<()>;
}

/// In-process implementation over a tokio broadcast channel.
///
/// One `TabBroadcast` shared by N controllers models N same-origin tabs.
#[derive(Debug, Clone)]
pub struct TabBroadcast {
    tx: broadcast::Sender<()>,
}

impl TabBroadcast {
    /// Creates a new broadcast group.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }
}

impl Default for TabBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBroadcast for TabBroadcast {
    fn publish_logout(&self) {
        // Send fails only when no tab is subscribed; nothing to cancel then.
        let _ = self.tx.send(());
    }

    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}
