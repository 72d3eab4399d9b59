//! Error types for session vault operations.
//!
//! Backend event failures never surface here; they are handled inside the
//! worker. What reaches callers are direct-call failures, initialization
//! failures and plumbing problems.

use sessionvault_platform::VaultError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionVaultError {
    /// A direct backend call failed.
    #[error("Vault backend error: {0}")]
    Backend(#[from] VaultError),

    /// The backend could not be queried while initializing. Not recoverable.
    #[error("Vault initialization failed: {0}")]
    Initialization(String),

    /// An operation was requested before `initialize()` succeeded.
    #[error("Session vault not initialized")]
    NotInitialized,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The vault worker is gone.
    #[error("Channel send error")]
    ChannelSend,

    /// The vault worker dropped the reply.
    #[error("Channel receive error")]
    ChannelReceive,
}

impl SessionVaultError {
    /// Stable code for programmatic handling in the UI.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Backend(_) => "BACKEND_ERROR",
            Self::Initialization(_) => "INITIALIZATION_FAILED",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::ChannelSend => "CHANNEL_SEND",
            Self::ChannelReceive => "CHANNEL_RECEIVE",
        }
    }
}

impl serde::Serialize for SessionVaultError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("SessionVaultError", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

pub type Result<T> = std::result::Result<T, SessionVaultError>;
