//! App foreground/background signal source.
//!
//! The platform (or the UI shell) reports visibility changes through
//! [`AppLifecycle::set_active`]. Interested parties hold a
//! [`LifecycleListener`]; dropping the listener unsubscribes it, so there is no
//! global "remove all listeners" switch to misuse.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Capacity for pending transitions per listener.
const LIFECYCLE_CHANNEL_CAPACITY: usize = 16;

/// A single foreground/background transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStateChange {
    pub is_active: bool,
}

/// Broadcasts app-state transitions to every live listener.
#[derive(Clone)]
pub struct AppLifecycle {
    tx: broadcast::Sender<AppStateChange>,
    active: Arc<AtomicBool>,
}

impl AppLifecycle {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(LIFECYCLE_CHANNEL_CAPACITY);
        Self {
            tx,
            active: Arc::new(AtomicBool::new(true)), // Assume foreground at start
        }
    }

    /// Report a visibility change.
    pub fn set_active(&self, is_active: bool) {
        self.active.store(is_active, Ordering::SeqCst);
        // No listeners is fine; nobody cares about this transition.
        let delivered = self.tx.send(AppStateChange { is_active }).unwrap_or(0);
        debug!(
            "App state changed to {} ({} listeners)",
            if is_active { "foreground" } else { "background" },
            delivered
        );
    }

    /// Last reported visibility.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Register a new listener. Dropping it unregisters.
    pub fn subscribe(&self) -> LifecycleListener {
        LifecycleListener {
            rx: self.tx.subscribe(),
            active: self.active.clone(),
        }
    }

    /// Number of listeners currently registered.
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for AppLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// An owned subscription to [`AppLifecycle`].
pub struct LifecycleListener {
    rx: broadcast::Receiver<AppStateChange>,
    active: Arc<AtomicBool>,
}

impl LifecycleListener {
    /// Wait for the next transition. Returns `None` once the source is gone.
    ///
    /// After a lag the last reported state is delivered first, so a skipped
    /// foreground transition is never lost entirely.
    pub async fn recv(&mut self) -> Option<AppStateChange> {
        match self.rx.recv().await {
            Ok(change) => Some(change),
            Err(broadcast::error::RecvError::Lagged(skipped)) => Some(self.after_lag(skipped)),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    /// Take the next transition if one is already queued.
    pub fn try_recv(&mut self) -> Option<AppStateChange> {
        match self.rx.try_recv() {
            Ok(change) => Some(change),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => Some(self.after_lag(skipped)),
            Err(_) => None,
        }
    }

    fn after_lag(&self, skipped: u64) -> AppStateChange {
        let is_active = self.active.load(Ordering::SeqCst);
        warn!(
            "Lifecycle listener lagged, skipped {} transitions, resuming from {}",
            skipped,
            if is_active { "foreground" } else { "background" }
        );
        AppStateChange { is_active }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropping_listener_unsubscribes() {
        let lifecycle = AppLifecycle::new();
        let first = lifecycle.subscribe();
        let second = lifecycle.subscribe();
        assert_eq!(lifecycle.listener_count(), 2);

        drop(first);
        assert_eq!(lifecycle.listener_count(), 1);
        drop(second);
        assert_eq!(lifecycle.listener_count(), 0);
    }

    #[test]
    fn test_transitions_are_delivered_in_order() {
        let lifecycle = AppLifecycle::new();
        let mut listener = lifecycle.subscribe();

        lifecycle.set_active(false);
        lifecycle.set_active(true);

        assert_eq!(listener.try_recv(), Some(AppStateChange { is_active: false }));
        assert_eq!(listener.try_recv(), Some(AppStateChange { is_active: true }));
        assert_eq!(listener.try_recv(), None);
        assert!(lifecycle.is_active());
    }

    #[test]
    fn test_lagged_listener_resumes_from_current_state() {
        let lifecycle = AppLifecycle::new();
        let mut listener = lifecycle.subscribe();

        lifecycle.set_active(true);
        for _ in 0..LIFECYCLE_CHANNEL_CAPACITY + 4 {
            lifecycle.set_active(false);
        }
        lifecycle.set_active(true);

        // The skipped transitions are summarized by the current state
        assert_eq!(listener.try_recv(), Some(AppStateChange { is_active: true }));
        let mut last = None;
        while let Some(change) = listener.try_recv() {
            last = Some(change);
        }
        assert_eq!(last, Some(AppStateChange { is_active: true }));
    }

    #[test]
    fn test_set_active_without_listeners() {
        let lifecycle = AppLifecycle::new();
        lifecycle.set_active(false);
        assert!(!lifecycle.is_active());
    }
}
