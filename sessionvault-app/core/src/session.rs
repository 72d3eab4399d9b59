//! Status transitions shared by commands, event handlers and the lifecycle
//! bridge.
//!
//! Every function here reads the backend and writes [`SessionStatus`]; none of
//! them publish. The worker publishes once the whole command or event has been
//! applied.

use std::sync::Arc;

use sessionvault_platform::VaultBackend;
use tracing::{debug, warn};

use crate::error::Result;
use crate::status::{SessionSecret, SessionStatus};

pub(crate) struct Session {
    backend: Arc<dyn VaultBackend>,
    key: String,
    pub(crate) status: SessionStatus,
}

impl Session {
    pub fn new(backend: Arc<dyn VaultBackend>, key: String, status: SessionStatus) -> Self {
        Self {
            backend,
            key,
            status,
        }
    }

    pub fn backend(&self) -> &dyn VaultBackend {
        self.backend.as_ref()
    }

    /// Re-read emptiness. Keeps the cached value if the backend cannot answer.
    pub async fn refresh_empty(&mut self) {
        match self.backend.is_empty().await {
            Ok(empty) => self.status.empty = empty,
            Err(e) => warn!("Could not refresh vault emptiness: {}", e),
        }
    }

    /// Re-read the lock state. A locked vault never exposes a secret.
    pub async fn refresh_locked(&mut self) {
        match self.backend.is_locked().await {
            Ok(locked) => {
                self.status.locked = locked;
                if locked {
                    self.status.secret = None;
                }
            }
            Err(e) => warn!("Could not refresh vault lock state: {}", e),
        }
    }

    /// Persist a new session secret.
    pub async fn write(&mut self, secret: SessionSecret) -> Result<()> {
        self.backend.set_value(&self.key, secret.expose()).await?;
        // Writing to a locked vault unlocks it
        if self.status.locked {
            self.refresh_locked().await;
        }
        self.status.secret = Some(secret);
        self.refresh_empty().await;
        debug!("Session stored");
        Ok(())
    }

    /// Read the secret back, prompting if locked.
    ///
    /// Failure is not an error for the caller: the secret becomes the empty
    /// sentinel so the UI can tell "tried and failed" from "never set".
    pub async fn restore(&mut self) {
        match self.backend.get_value(&self.key).await {
            Ok(value) => {
                if self.status.locked {
                    self.refresh_locked().await;
                }
                debug!(
                    "Session restored ({})",
                    if value.is_some() { "present" } else { "absent" }
                );
                self.status.secret = value.map(SessionSecret::new);
            }
            Err(e) => {
                debug!("Session restore failed with {}, marking sentinel", e.code);
                self.status.secret = Some(SessionSecret::sentinel());
            }
        }
    }

    /// Wipe the backend and reset to empty-state semantics.
    pub async fn clear(&mut self) -> Result<()> {
        self.backend.clear().await?;
        self.status.secret = None;
        self.refresh_locked().await;
        self.refresh_empty().await;
        debug!("Vault cleared, empty: {}", self.status.empty);
        Ok(())
    }

    /// Device-secured lock: secret hidden, material kept.
    pub async fn apply_lock(&mut self) {
        self.status.locked = true;
        self.status.secret = None;
        self.refresh_empty().await;
    }

    /// Memory-only lock: the storage is gone, which this policy reports as
    /// unlocked and empty rather than locked.
    pub async fn apply_wipe(&mut self) {
        self.status.locked = false;
        self.status.secret = None;
        self.refresh_empty().await;
    }

    /// Unlock does not restore the secret; callers ask for it explicitly.
    pub fn apply_unlock(&mut self) {
        self.status.locked = false;
    }
}
