//! The session vault service.
//!
//! [`SessionVault`] is a cheap, cloneable handle. All state lives in a single
//! worker task, so operations from different handles never interleave their
//! backend calls and the published [`SessionStatus`] always reflects a whole
//! operation.

mod command;
mod worker;

use std::sync::Arc;

use sessionvault_platform::{AppLifecycle, UnlockPolicy, VaultBackend};
use tokio::sync::{mpsc, oneshot, watch};

use crate::error::{Result, SessionVaultError};
use crate::recovery::{Presenter, RecoveryHandler};
use crate::session::Session;
use crate::status::{SessionSecret, SessionStatus};
use command::VaultCommand;
use worker::VaultWorker;

/// Pending commands before callers start waiting on the worker.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

#[derive(Clone)]
pub struct SessionVault {
    command_tx: mpsc::Sender<VaultCommand>,
    status_rx: watch::Receiver<SessionStatus>,
}

impl SessionVault {
    /// Spawn the worker. Must be called from within a tokio runtime.
    ///
    /// Nothing is read from the backend until [`initialize`](Self::initialize).
    pub fn new(
        backend: Arc<dyn VaultBackend>,
        lifecycle: AppLifecycle,
        presenter: Arc<dyn Presenter>,
        session_key: impl Into<String>,
    ) -> Self {
        let initial = SessionStatus::initial(UnlockPolicy::BIOMETRIC);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (status_tx, status_rx) = watch::channel(initial.clone());

        let session = Session::new(backend, session_key.into(), initial);
        let worker = VaultWorker::new(
            session,
            lifecycle,
            RecoveryHandler::new(presenter),
            command_rx,
            status_tx,
        );
        tokio::spawn(worker.run());

        Self {
            command_tx,
            status_rx,
        }
    }

    /// Read the backend config and emptiness, and subscribe to backend events.
    /// Safe to call again; handlers are only installed once.
    pub async fn initialize(&self) -> Result<()> {
        self.request(|reply| VaultCommand::Initialize { reply }).await
    }

    /// Store a new session secret.
    pub async fn set_session(&self, secret: impl Into<String>) -> Result<()> {
        let secret = SessionSecret::new(secret);
        self.request(|reply| VaultCommand::SetSession { secret, reply })
            .await
    }

    /// Load the secret from the backend, prompting if locked. A refused or
    /// failed prompt leaves the empty-string sentinel rather than an error.
    pub async fn restore_session(&self) -> Result<()> {
        self.request(|reply| VaultCommand::RestoreSession { reply })
            .await
    }

    pub async fn lock_vault(&self) -> Result<()> {
        self.request(|reply| VaultCommand::Lock { reply }).await
    }

    /// Restore when locked, lock otherwise.
    pub async fn lock_or_restore(&self) -> Result<()> {
        self.request(|reply| VaultCommand::LockOrRestore { reply })
            .await
    }

    /// `true` selects the biometric device-security policy, `false` the
    /// memory-only policy.
    pub async fn toggle_biometrics(&self, enable: bool) -> Result<()> {
        self.request(|reply| VaultCommand::ToggleBiometrics { enable, reply })
            .await
    }

    pub async fn clear_vault(&self) -> Result<()> {
        self.request(|reply| VaultCommand::Clear { reply }).await
    }

    /// Status after every event already queued has been applied.
    pub async fn current_status(&self) -> Result<SessionStatus> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(VaultCommand::Snapshot { reply })
            .await
            .map_err(|_| SessionVaultError::ChannelSend)?;
        rx.await.map_err(|_| SessionVaultError::ChannelReceive)
    }

    /// Last published status.
    pub fn status(&self) -> SessionStatus {
        self.status_rx.borrow().clone()
    }

    /// Receiver notified each time the published status changes.
    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status_rx.clone()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T>>) -> VaultCommand,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(make(reply))
            .await
            .map_err(|_| SessionVaultError::ChannelSend)?;
        rx.await.map_err(|_| SessionVaultError::ChannelReceive)?
    }
}
