//! Policy-specific transition tables.
//!
//! The worker does not branch on the unlock policy itself; it asks the
//! current [`PolicyMode`] how a lock applies and whether lifecycle signals
//! matter. Everything memory-only lives behind the `MemoryOnly` variant.

use sessionvault_platform::{AppLifecycle, AppStateChange, UnlockPolicy};
use tracing::info;

use crate::bridge::LifecycleBridge;
use crate::session::Session;

pub(crate) enum PolicyMode {
    /// Device-secured (or passcode) policies. The backend reports its own
    /// lock events and keeps material across locks.
    Secured,
    /// Memory-only policy, with the bridge compensating for missing lock
    /// events.
    MemoryOnly(LifecycleBridge),
}

impl PolicyMode {
    /// Bring the mode in line with `policy`. Calling it again with the same
    /// policy changes nothing, so there is never more than one subscription.
    pub fn reconcile(&mut self, policy: UnlockPolicy, lifecycle: &AppLifecycle) {
        match (policy.is_memory_only(), &*self) {
            (true, Self::MemoryOnly(_)) | (false, Self::Secured) => {}
            (true, Self::Secured) => {
                *self = Self::MemoryOnly(LifecycleBridge::attach(lifecycle));
                info!("Memory-only policy active, foreground refresh attached");
            }
            (false, Self::MemoryOnly(_)) => {
                *self = Self::Secured;
                info!("Left memory-only policy, foreground refresh detached");
            }
        }
    }

    /// Backend reported a lock.
    pub async fn apply_lock_event(&self, session: &mut Session) {
        match self {
            Self::Secured => session.apply_lock().await,
            Self::MemoryOnly(bridge) => bridge.apply_lock(session).await,
        }
    }

    /// `lock()` returned. Secured backends follow up with an event; memory-only
    /// ones do not, so the effect is applied here.
    pub async fn after_explicit_lock(&self, session: &mut Session) {
        if let Self::MemoryOnly(bridge) = self {
            bridge.apply_lock(session).await;
        }
    }

    pub async fn on_app_state(&self, change: AppStateChange, session: &mut Session) {
        if let Self::MemoryOnly(bridge) = self {
            bridge.on_app_state(change, session).await;
        }
    }

    /// Next lifecycle transition that matters to this mode.
    pub async fn next_app_state(&mut self) -> AppStateChange {
        match self {
            Self::Secured => std::future::pending().await,
            Self::MemoryOnly(bridge) => bridge.next_change().await,
        }
    }

    pub fn try_next_app_state(&mut self) -> Option<AppStateChange> {
        match self {
            Self::Secured => None,
            Self::MemoryOnly(bridge) => bridge.try_next_change(),
        }
    }
}
