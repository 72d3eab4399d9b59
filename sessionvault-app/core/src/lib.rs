//! Session vault: keeps a single session secret in a platform vault and
//! tracks its lock state for the UI.
//!
//! Two unlock policies are switched between at runtime:
//! - biometric device security, where a lock hides the secret until the user
//!   authenticates again
//! - memory-only, where a lock (or a long enough trip to the background) wipes
//!   the secret
//!
//! When the platform reports that the protecting credential was invalidated,
//! the vault is wiped and the user is sent back to login.

mod bridge;
pub mod config;
mod error;
mod policy;
pub mod recovery;
mod session;
mod status;
mod vault;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{load_settings, save_settings, ServiceSettings, DEFAULT_SESSION_KEY};
pub use error::{Result, SessionVaultError};
pub use recovery::{Notice, NoticePosition, NoticeSeverity, Presenter, Route};
pub use status::{SessionSecret, SessionStatus, VaultState};
pub use vault::SessionVault;
