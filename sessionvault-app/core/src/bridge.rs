//! Foreground refresh for the memory-only policy.
//!
//! Memory-only backends wipe their storage when the app sits in the
//! background past the auto-lock delay, but they do not emit a lock event for
//! it. The bridge listens for the app returning to the foreground and
//! re-reads the backend so the cached status does not claim a secret that no
//! longer exists.
//!
//! A bridge only exists inside [`crate::policy::PolicyMode::MemoryOnly`];
//! dropping it drops the lifecycle subscription.

use sessionvault_platform::{AppLifecycle, AppStateChange, LifecycleListener};
use tracing::debug;

use crate::session::Session;

pub(crate) struct LifecycleBridge {
    listener: LifecycleListener,
}

impl LifecycleBridge {
    pub fn attach(lifecycle: &AppLifecycle) -> Self {
        Self {
            listener: lifecycle.subscribe(),
        }
    }

    /// Next app-state transition. Never resolves once the source is gone.
    pub async fn next_change(&mut self) -> AppStateChange {
        match self.listener.recv().await {
            Some(change) => change,
            None => {
                debug!("Lifecycle source closed, bridge going idle");
                std::future::pending().await
            }
        }
    }

    pub fn try_next_change(&mut self) -> Option<AppStateChange> {
        self.listener.try_recv()
    }

    /// React to an app-state transition.
    pub async fn on_app_state(&self, change: AppStateChange, session: &mut Session) {
        if !change.is_active {
            return;
        }

        debug!("App resumed under memory-only policy, re-reading vault");
        session.refresh_empty().await;
        session.refresh_locked().await;
        if !session.status.locked {
            session.restore().await;
        }
    }

    /// Apply a lock that the backend will not report.
    pub async fn apply_lock(&self, session: &mut Session) {
        session.apply_wipe().await;
    }
}
