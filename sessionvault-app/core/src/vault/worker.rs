//! The task that owns the session status.
//!
//! Commands, backend events and lifecycle signals all land here and are
//! applied one at a time. Before and after each command the worker drains
//! whatever events are already queued, so a reply is only sent once the
//! effects of the call (including the events it caused) are reflected in the
//! published status.

use sessionvault_platform::{AppLifecycle, AppStateChange, UnlockPolicy, VaultEvent};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use super::command::VaultCommand;
use crate::error::{Result, SessionVaultError};
use crate::policy::PolicyMode;
use crate::recovery::{self, ErrorDisposition, RecoveryHandler};
use crate::session::Session;
use crate::status::{SessionSecret, SessionStatus};

pub(crate) struct VaultWorker {
    session: Session,
    mode: PolicyMode,
    lifecycle: AppLifecycle,
    recovery: RecoveryHandler,
    /// Backend events, subscribed on the first successful initialize.
    events: Option<broadcast::Receiver<VaultEvent>>,
    handlers_installed: bool,
    initialized: bool,
    command_rx: mpsc::Receiver<VaultCommand>,
    status_tx: watch::Sender<SessionStatus>,
}

impl VaultWorker {
    pub fn new(
        session: Session,
        lifecycle: AppLifecycle,
        recovery: RecoveryHandler,
        command_rx: mpsc::Receiver<VaultCommand>,
        status_tx: watch::Sender<SessionStatus>,
    ) -> Self {
        Self {
            session,
            mode: PolicyMode::Secured,
            lifecycle,
            recovery,
            events: None,
            handlers_installed: false,
            initialized: false,
            command_rx,
            status_tx,
        }
    }

    pub async fn run(mut self) {
        debug!("Session vault worker started");

        loop {
            tokio::select! {
                command = self.command_rx.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    self.drain_pending().await;
                    self.handle_command(command).await;
                }

                signal = next_event(&mut self.events) => {
                    match signal {
                        Some(BackendSignal::Event(event)) => self.handle_event(event).await,
                        Some(BackendSignal::Lagged(skipped)) => self.resync(skipped).await,
                        None => {
                            warn!("Backend event stream closed");
                            self.events = None;
                        }
                    }
                    self.publish();
                }

                change = self.mode.next_app_state() => {
                    self.handle_app_state(change).await;
                    self.publish();
                }
            }
        }

        debug!("All session vault handles dropped, worker stopping");
    }

    async fn handle_command(&mut self, command: VaultCommand) {
        debug!("Handling {} command", command.name());

        match command {
            VaultCommand::Initialize { reply } => {
                let result = self.initialize().await;
                self.finish(reply, result).await;
            }
            VaultCommand::SetSession { secret, reply } => {
                let result = self.set_session(secret).await;
                self.finish(reply, result).await;
            }
            VaultCommand::RestoreSession { reply } => {
                let result = self.restore_session().await;
                self.finish(reply, result).await;
            }
            VaultCommand::Lock { reply } => {
                let result = self.lock().await;
                self.finish(reply, result).await;
            }
            VaultCommand::LockOrRestore { reply } => {
                let result = self.lock_or_restore().await;
                self.finish(reply, result).await;
            }
            VaultCommand::ToggleBiometrics { enable, reply } => {
                let result = self.toggle_biometrics(enable).await;
                self.finish(reply, result).await;
            }
            VaultCommand::Clear { reply } => {
                let result = self.clear().await;
                self.finish(reply, result).await;
            }
            VaultCommand::Snapshot { reply } => {
                self.publish();
                let _ = reply.send(self.session.status.clone());
            }
        }
    }

    /// Apply the events the command caused, publish, then answer.
    async fn finish<T>(&mut self, reply: oneshot::Sender<Result<T>>, result: Result<T>) {
        if let Err(e) = &result {
            debug!("Command failed: {}", e);
        }
        self.drain_pending().await;
        self.publish();
        if reply.send(result).is_err() {
            debug!("Caller dropped before the reply was sent");
        }
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(SessionVaultError::NotInitialized)
        }
    }

    async fn initialize(&mut self) -> Result<()> {
        let backend = self.session.backend();
        let config = backend.config().await;
        let empty = backend
            .is_empty()
            .await
            .map_err(|e| SessionVaultError::Initialization(e.to_string()))?;

        if !self.handlers_installed {
            self.events = Some(backend.subscribe());
            self.handlers_installed = true;
            debug!("Backend event handlers installed");
        }

        self.session.status.empty = empty;
        self.session.status.mirror_policy(config.unlock_policy);
        self.mode.reconcile(config.unlock_policy, &self.lifecycle);

        if !self.initialized {
            info!(
                "Session vault initialized: policy={}, empty={}",
                config.unlock_policy.kind(),
                empty
            );
        }
        self.initialized = true;
        Ok(())
    }

    async fn set_session(&mut self, secret: SessionSecret) -> Result<()> {
        self.ensure_initialized()?;
        self.session.write(secret).await
    }

    async fn restore_session(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        self.session.restore().await;
        Ok(())
    }

    async fn lock(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        self.session.backend().lock().await?;
        self.mode.after_explicit_lock(&mut self.session).await;
        Ok(())
    }

    async fn lock_or_restore(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        if self.session.status.locked {
            self.session.restore().await;
            Ok(())
        } else {
            self.lock().await
        }
    }

    /// Switch between biometric and memory-only policies in a single config
    /// update. The local flag is flipped first and rolled back on failure.
    async fn toggle_biometrics(&mut self, enable: bool) -> Result<()> {
        self.ensure_initialized()?;

        let previous = std::mem::replace(&mut self.session.status.biometrics_enabled, enable);
        let policy = if enable {
            UnlockPolicy::BIOMETRIC
        } else {
            UnlockPolicy::MemoryOnly
        };

        let backend = self.session.backend();
        let config = backend.config().await.with_policy(policy);
        if let Err(e) = backend.update_config(config).await {
            warn!("Failed to switch unlock policy to {}: {}", policy.kind(), e);
            self.session.status.biometrics_enabled = previous;
            return Err(e.into());
        }

        self.session.status.mirror_policy(policy);
        self.mode.reconcile(policy, &self.lifecycle);
        info!("Unlock policy switched to {}", policy.kind());
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        self.session.clear().await
    }

    async fn handle_event(&mut self, event: VaultEvent) {
        match event {
            VaultEvent::Locked => {
                debug!("Backend locked");
                self.mode.apply_lock_event(&mut self.session).await;
            }
            VaultEvent::Unlocked => {
                debug!("Backend unlocked");
                self.session.apply_unlock();
            }
            VaultEvent::ConfigChanged(config) => {
                debug!("Backend config changed: policy={}", config.unlock_policy.kind());
                self.session.status.mirror_policy(config.unlock_policy);
                self.mode.reconcile(config.unlock_policy, &self.lifecycle);
            }
            VaultEvent::Error(err) => match recovery::classify(&err) {
                ErrorDisposition::CredentialInvalidated => {
                    warn!("Vault credential invalidated ({}), wiping vault", err);
                    if let Err(e) = self.session.clear().await {
                        error!("Failed to clear vault after credential invalidation: {}", e);
                    }
                    self.recovery.credential_invalidated();
                }
                ErrorDisposition::UnconfirmedKeystoreError => {
                    warn!("Keystore error without invalidation signature, ignoring: {}", err);
                }
                ErrorDisposition::Unhandled => {
                    debug!("Backend error event: {}", err);
                }
            },
        }
    }

    /// Events were dropped, so the cached status can no longer be trusted.
    /// Re-read everything the missed events could have changed.
    async fn resync(&mut self, skipped: u64) {
        warn!("Missed {} backend events, resyncing status from backend", skipped);
        self.session.refresh_locked().await;
        self.session.refresh_empty().await;
        let config = self.session.backend().config().await;
        self.session.status.mirror_policy(config.unlock_policy);
        self.mode.reconcile(config.unlock_policy, &self.lifecycle);
    }

    async fn handle_app_state(&mut self, change: AppStateChange) {
        self.mode.on_app_state(change, &mut self.session).await;
    }

    /// Apply every backend event and lifecycle signal that is already queued.
    async fn drain_pending(&mut self) {
        loop {
            let next = match self.events.as_mut() {
                Some(rx) => rx.try_recv(),
                None => break,
            };
            match next {
                Ok(event) => self.handle_event(event).await,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Lagged(skipped)) => self.resync(skipped).await,
                Err(TryRecvError::Closed) => {
                    warn!("Backend event stream closed");
                    self.events = None;
                    break;
                }
            }
        }

        while let Some(change) = self.mode.try_next_app_state() {
            self.handle_app_state(change).await;
        }
    }

    fn publish(&self) {
        let status = self.session.status.clone();
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }
}

enum BackendSignal {
    Event(VaultEvent),
    /// The subscription overflowed and this many events were dropped.
    Lagged(u64),
}

/// Next backend event, or never if not subscribed.
async fn next_event(events: &mut Option<broadcast::Receiver<VaultEvent>>) -> Option<BackendSignal> {
    let Some(rx) = events.as_mut() else {
        return std::future::pending().await;
    };
    match rx.recv().await {
        Ok(event) => Some(BackendSignal::Event(event)),
        Err(RecvError::Lagged(skipped)) => Some(BackendSignal::Lagged(skipped)),
        Err(RecvError::Closed) => None,
    }
}
