//! Data types shared between vault backends and their consumers.

use serde::{Deserialize, Serialize};

use crate::error::{VaultError, VaultErrorCode};

/// Default vault identifier.
pub const DEFAULT_VAULT_KEY: &str = "sessionvault.default";

/// Default auto-lock delay after the app is backgrounded, in milliseconds.
pub const DEFAULT_AUTO_LOCK_DELAY_MS: u64 = 2000;

/// Default number of failed custom passcode attempts before the vault is wiped.
pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 2;

/// Which device credential unlocks a device-secured vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceSecurityKind {
    /// No device credential. Used by policies that are not device-secured.
    None,
    /// Fingerprint / face recognition.
    Biometrics,
    /// Device PIN, pattern or password.
    SystemPasscode,
    /// Biometrics with the system passcode as fallback.
    Both,
}

/// How the vault is unlocked. Exactly one policy is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "securityKind", rename_all = "camelCase")]
pub enum UnlockPolicy {
    /// Unlock requires platform device-credential confirmation.
    DeviceSecurity(DeviceSecurityKind),
    /// Secret lives only in memory; locking is equivalent to wiping.
    MemoryOnly,
    /// Unlock requires the device passcode.
    SystemPasscode,
    /// Unlock requires an app-specific passcode.
    CustomPasscode,
}

/// The policy family, without the security kind payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PolicyKind {
    DeviceSecurity,
    MemoryOnly,
    SystemPasscode,
    CustomPasscode,
}

impl UnlockPolicy {
    /// The biometric-backed policy used when biometrics are switched on.
    pub const BIOMETRIC: Self = Self::DeviceSecurity(DeviceSecurityKind::Biometrics);

    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::DeviceSecurity(_) => PolicyKind::DeviceSecurity,
            Self::MemoryOnly => PolicyKind::MemoryOnly,
            Self::SystemPasscode => PolicyKind::SystemPasscode,
            Self::CustomPasscode => PolicyKind::CustomPasscode,
        }
    }

    /// The device credential this policy unlocks with.
    pub fn security_kind(&self) -> DeviceSecurityKind {
        match self {
            Self::DeviceSecurity(kind) => *kind,
            Self::SystemPasscode => DeviceSecurityKind::SystemPasscode,
            Self::MemoryOnly | Self::CustomPasscode => DeviceSecurityKind::None,
        }
    }

    pub fn is_memory_only(&self) -> bool {
        matches!(self, Self::MemoryOnly)
    }
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeviceSecurity => write!(f, "device_security"),
            Self::MemoryOnly => write!(f, "memory_only"),
            Self::SystemPasscode => write!(f, "system_passcode"),
            Self::CustomPasscode => write!(f, "custom_passcode"),
        }
    }
}

impl std::fmt::Display for DeviceSecurityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Biometrics => write!(f, "biometrics"),
            Self::SystemPasscode => write!(f, "system_passcode"),
            Self::Both => write!(f, "both"),
        }
    }
}

/// Declarative vault policy.
///
/// `update_config` on a backend replaces the whole value, so callers derive a
/// new config from the current one instead of patching fields in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultConfig {
    /// Identifier of the vault instance.
    pub key: String,
    pub unlock_policy: UnlockPolicy,
    /// Delay before a backgrounded app locks the vault. 0 disables auto-lock.
    #[serde(default)]
    pub auto_lock_delay_ms: u64,
    pub max_failed_custom_passcode_attempts: u32,
    #[serde(default)]
    pub clear_on_too_many_failures: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_VAULT_KEY.to_string(),
            unlock_policy: UnlockPolicy::BIOMETRIC,
            auto_lock_delay_ms: DEFAULT_AUTO_LOCK_DELAY_MS,
            max_failed_custom_passcode_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            clear_on_too_many_failures: true,
        }
    }
}

impl VaultConfig {
    /// Copy of this config with a different unlock policy.
    pub fn with_policy(&self, unlock_policy: UnlockPolicy) -> Self {
        Self {
            unlock_policy,
            ..self.clone()
        }
    }

    /// Auto-lock delay, or `None` when auto-lock is disabled.
    pub fn auto_lock_delay(&self) -> Option<std::time::Duration> {
        (self.auto_lock_delay_ms > 0)
            .then(|| std::time::Duration::from_millis(self.auto_lock_delay_ms))
    }

    /// Check the invariants a backend relies on.
    pub fn validate(&self) -> Result<(), VaultError> {
        if self.key.trim().is_empty() {
            return Err(VaultError::new(
                VaultErrorCode::InvalidArguments,
                "Vault key must not be empty",
            ));
        }
        if self.max_failed_custom_passcode_attempts == 0 {
            return Err(VaultError::new(
                VaultErrorCode::InvalidArguments,
                "maxFailedCustomPasscodeAttempts must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Notifications a backend emits to its subscribers.
#[derive(Debug, Clone)]
pub enum VaultEvent {
    Locked,
    Unlocked,
    ConfigChanged(VaultConfig),
    Error(VaultError),
}
