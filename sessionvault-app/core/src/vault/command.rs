use tokio::sync::oneshot;

use crate::error::Result;
use crate::status::{SessionSecret, SessionStatus};

pub(crate) type Reply<T> = oneshot::Sender<Result<T>>;

/// Requests from a [`super::SessionVault`] handle to the worker.
pub(crate) enum VaultCommand {
    Initialize {
        reply: Reply<()>,
    },
    SetSession {
        secret: SessionSecret,
        reply: Reply<()>,
    },
    RestoreSession {
        reply: Reply<()>,
    },
    Lock {
        reply: Reply<()>,
    },
    /// Restore if locked, lock otherwise.
    LockOrRestore {
        reply: Reply<()>,
    },
    ToggleBiometrics {
        enable: bool,
        reply: Reply<()>,
    },
    Clear {
        reply: Reply<()>,
    },
    /// Current status once everything already queued has been applied.
    Snapshot {
        reply: oneshot::Sender<SessionStatus>,
    },
}

impl VaultCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::SetSession { .. } => "set_session",
            Self::RestoreSession { .. } => "restore_session",
            Self::Lock { .. } => "lock",
            Self::LockOrRestore { .. } => "lock_or_restore",
            Self::ToggleBiometrics { .. } => "toggle_biometrics",
            Self::Clear { .. } => "clear",
            Self::Snapshot { .. } => "snapshot",
        }
    }
}
