//! In-process vault backend.
//!
//! Stores values in memory and gates access with an [`Authenticator`]. This is
//! the fallback for platforms with no secure vault (a browser shell, a
//! desktop dev build); it provides the full backend contract but no
//! encryption at rest.
//!
//! Lock semantics per policy:
//! - **Device-secured policies**: `lock()` hides values until the next
//!   successful prompt and emits [`VaultEvent::Locked`]
//! - **MemoryOnly**: `lock()` wipes values and leaves the vault unlocked.
//!   Like the platform vaults, it emits no event for this; consumers must
//!   poll `is_empty()` / `is_locked()` to notice.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::error::{Result, VaultError, VaultErrorCode};
use crate::lifecycle::AppLifecycle;
use crate::models::{UnlockPolicy, VaultConfig, VaultEvent};
use crate::prompt::Authenticator;
use crate::VaultBackend;

/// Capacity for undelivered events per subscriber.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// In-memory [`VaultBackend`]. Cloning shares the same store.
#[derive(Clone)]
pub struct EphemeralBackend {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<StoreState>,
    events: broadcast::Sender<VaultEvent>,
    authenticator: Arc<dyn Authenticator>,
}

struct StoreState {
    config: VaultConfig,
    values: HashMap<String, Zeroizing<String>>,
    locked: bool,
    failed_attempts: u32,
    /// Bumped on every lifecycle transition; a pending auto-lock only fires
    /// if nothing happened since it was scheduled.
    lock_generation: u64,
}

impl StoreState {
    fn wipe(&mut self) {
        // Zeroizing<String> scrubs each value as it is dropped
        self.values.clear();
        self.locked = false;
        self.failed_attempts = 0;
    }
}

impl EphemeralBackend {
    /// Create an empty, unlocked backend.
    pub fn new(config: VaultConfig, authenticator: Arc<dyn Authenticator>) -> Result<Self> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        info!(
            "Ephemeral vault '{}' created with {} policy",
            config.key,
            config.unlock_policy.kind()
        );
        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(StoreState {
                    config,
                    values: HashMap::new(),
                    locked: false,
                    failed_attempts: 0,
                    lock_generation: 0,
                }),
                events,
                authenticator,
            }),
        })
    }

    /// Lock the vault automatically once the app has been in the background
    /// for the configured auto-lock delay.
    ///
    /// The returned task runs until the lifecycle source is dropped.
    pub fn watch_lifecycle(&self, lifecycle: &AppLifecycle) -> JoinHandle<()> {
        let backend = self.clone();
        let mut listener = lifecycle.subscribe();

        tokio::spawn(async move {
            while let Some(change) = listener.recv().await {
                let (generation, delay) = {
                    let mut state = backend.inner.state.lock().await;
                    state.lock_generation += 1;
                    (state.lock_generation, state.config.auto_lock_delay())
                };

                if change.is_active {
                    continue;
                }
                let Some(delay) = delay else {
                    continue;
                };

                debug!("App backgrounded, auto-lock in {:?}", delay);
                let timer_backend = backend.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let still_background =
                        timer_backend.inner.state.lock().await.lock_generation == generation;
                    if !still_background {
                        return;
                    }
                    info!("Auto-lock delay elapsed, locking vault");
                    if let Err(e) = timer_backend.lock().await {
                        warn!("Auto-lock failed: {}", e);
                    }
                });
            }
            debug!("Lifecycle source closed, auto-lock watcher stopping");
        })
    }

    fn emit(&self, event: VaultEvent) {
        // Sending fails only when nobody is subscribed
        if self.inner.events.send(event).is_err() {
            debug!("Vault event dropped: no subscribers");
        }
    }

    /// Prompt for the device credential if the vault is locked.
    async fn ensure_unlocked(&self) -> Result<()> {
        let policy = {
            let state = self.inner.state.lock().await;
            if !state.locked {
                return Ok(());
            }
            state.config.unlock_policy
        };

        debug!("Vault locked, prompting for {} credential", policy.kind());
        match self.inner.authenticator.authenticate(&policy).await {
            Ok(()) => {
                {
                    let mut state = self.inner.state.lock().await;
                    state.locked = false;
                    state.failed_attempts = 0;
                }
                info!("Vault unlocked");
                self.emit(VaultEvent::Unlocked);
                Ok(())
            }
            Err(err) => Err(self.handle_auth_failure(err).await),
        }
    }

    async fn handle_auth_failure(&self, err: VaultError) -> VaultError {
        match err.code {
            VaultErrorCode::InvalidatedCredential => {
                warn!("Device credential invalidated: {}", err.message);
                self.emit(VaultEvent::Error(err.clone()));
                err
            }
            VaultErrorCode::AuthFailed => {
                let mut state = self.inner.state.lock().await;
                if state.config.unlock_policy != UnlockPolicy::CustomPasscode {
                    return err;
                }

                state.failed_attempts += 1;
                let limit = state.config.max_failed_custom_passcode_attempts;
                warn!("Failed unlock attempt {}/{}", state.failed_attempts, limit);
                if state.failed_attempts < limit {
                    return err;
                }

                let too_many = VaultError::new(
                    VaultErrorCode::TooManyFailedAttempts,
                    format!("{} failed unlock attempts", state.failed_attempts),
                );
                if state.config.clear_on_too_many_failures {
                    warn!("Too many failed attempts, clearing vault");
                    state.wipe();
                    drop(state);
                    self.emit(VaultEvent::Error(too_many.clone()));
                } else {
                    state.failed_attempts = 0;
                }
                too_many
            }
            _ => err,
        }
    }
}

#[async_trait]
impl VaultBackend for EphemeralBackend {
    async fn config(&self) -> VaultConfig {
        self.inner.state.lock().await.config.clone()
    }

    async fn update_config(&self, config: VaultConfig) -> Result<()> {
        config.validate()?;

        // Data is migrated to the new policy, so a device-secured vault has
        // to be opened first.
        self.ensure_unlocked().await?;

        {
            let mut state = self.inner.state.lock().await;
            info!(
                "Vault policy {} -> {}",
                state.config.unlock_policy.kind(),
                config.unlock_policy.kind()
            );
            state.config = config.clone();
            state.failed_attempts = 0;
        }
        self.emit(VaultEvent::ConfigChanged(config));
        Ok(())
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_unlocked().await?;
        let mut state = self.inner.state.lock().await;
        state
            .values
            .insert(key.to_string(), Zeroizing::new(value.to_string()));
        debug!("Stored {} char value under '{}'", value.len(), key);
        Ok(())
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        self.ensure_unlocked().await?;
        let state = self.inner.state.lock().await;
        let value = state.values.get(key).map(|v| String::clone(v));
        debug!(
            "Retrieved '{}' ({})",
            key,
            if value.is_some() { "present" } else { "absent" }
        );
        Ok(value)
    }

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.inner.state.lock().await.values.is_empty())
    }

    async fn is_locked(&self) -> Result<bool> {
        Ok(self.inner.state.lock().await.locked)
    }

    async fn lock(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock().await;
            if state.config.unlock_policy.is_memory_only() {
                state.wipe();
                info!("Memory-only vault wiped on lock");
                return Ok(());
            }
            if state.locked {
                debug!("Vault already locked");
                return Ok(());
            }
            state.locked = true;
        }
        info!("Vault locked");
        self.emit(VaultEvent::Locked);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.inner.state.lock().await.wipe();
        info!("Vault cleared");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<VaultEvent> {
        self.inner.events.subscribe()
    }
}
