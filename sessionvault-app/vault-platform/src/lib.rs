//! Platform capabilities consumed by the session vault.
//!
//! - [`VaultBackend`]: the opaque secure-storage capability
//! - [`AppLifecycle`]: foreground/background transitions
//! - [`Authenticator`]: the device-credential prompt
//! - [`EphemeralBackend`]: in-process fallback backend for platforms without a
//!   secure vault

use async_trait::async_trait;
use tokio::sync::broadcast;

mod ephemeral;
mod error;
mod lifecycle;
mod models;
mod prompt;

pub use ephemeral::EphemeralBackend;
pub use error::{Result, VaultError, VaultErrorCode};
pub use lifecycle::{AppLifecycle, AppStateChange, LifecycleListener};
pub use models::*;
pub use prompt::{Authenticator, AutoApprove};

/// Secure storage holding named string values under a [`VaultConfig`].
///
/// Calls may suspend for as long as a credential prompt is on screen.
/// Implementations are not required to tolerate concurrent sensitive calls;
/// callers serialize them.
#[async_trait]
pub trait VaultBackend: Send + Sync {
    /// The config currently applied.
    async fn config(&self) -> VaultConfig;

    /// Replace the whole config in one step. Emits [`VaultEvent::ConfigChanged`].
    async fn update_config(&self, config: VaultConfig) -> Result<()>;

    async fn set_value(&self, key: &str, value: &str) -> Result<()>;

    /// Read a value, prompting for the device credential if the vault is locked.
    async fn get_value(&self, key: &str) -> Result<Option<String>>;

    async fn is_empty(&self) -> Result<bool>;

    async fn is_locked(&self) -> Result<bool>;

    async fn lock(&self) -> Result<()>;

    /// Remove every stored value.
    async fn clear(&self) -> Result<()>;

    /// Subscribe to lock, unlock, config and error notifications.
    fn subscribe(&self) -> broadcast::Receiver<VaultEvent>;
}
