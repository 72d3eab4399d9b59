//! Session status types.
//!
//! [`SessionStatus`] is the read-only snapshot the UI renders. It is derived
//! from backend answers and events, never stored on its own.

use serde::Serialize;
use sessionvault_platform::{DeviceSecurityKind, PolicyKind, UnlockPolicy};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The session token, scrubbed from memory on drop.
///
/// An empty value is the restore-failed sentinel: a restore was attempted and
/// the backend refused (cancelled prompt, failed credential, platform error).
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionSecret(String);

impl SessionSecret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The "restore attempted but failed" marker.
    pub fn sentinel() -> Self {
        Self(String::new())
    }

    pub fn is_sentinel(&self) -> bool {
        self.0.is_empty()
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_sentinel() {
            f.write_str("SessionSecret(<sentinel>)")
        } else {
            f.write_str("SessionSecret([REDACTED])")
        }
    }
}

impl Serialize for SessionSecret {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

/// Conceptual vault state, projected from a [`SessionStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum VaultState {
    Locked,
    UnlockedEmpty,
    UnlockedHasSecret,
}

impl std::fmt::Display for VaultState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locked => write!(f, "Locked"),
            Self::UnlockedEmpty => write!(f, "Unlocked (empty)"),
            Self::UnlockedHasSecret => write!(f, "Unlocked (has secret)"),
        }
    }
}

/// Snapshot of the vault as the UI sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// A real secret is present only while unlocked and previously set or
    /// restored. A failed restore leaves the empty sentinel, even while locked.
    pub secret: Option<SessionSecret>,
    pub locked: bool,
    /// No secret is persisted in the backend.
    pub empty: bool,
    /// Local preference; not confirmed by the backend.
    pub biometrics_enabled: bool,
    pub active_policy: PolicyKind,
    pub active_security_kind: DeviceSecurityKind,
}

impl SessionStatus {
    /// Status at construction, before the backend has been read.
    pub fn initial(policy: UnlockPolicy) -> Self {
        Self {
            secret: None,
            locked: false,
            empty: true,
            biometrics_enabled: true,
            active_policy: policy.kind(),
            active_security_kind: policy.security_kind(),
        }
    }

    /// Secret as a string slice, sentinel included.
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_ref().map(SessionSecret::expose)
    }

    pub fn state(&self) -> VaultState {
        if self.locked {
            VaultState::Locked
        } else if self.empty {
            VaultState::UnlockedEmpty
        } else {
            VaultState::UnlockedHasSecret
        }
    }

    pub(crate) fn mirror_policy(&mut self, policy: UnlockPolicy) {
        self.active_policy = policy.kind();
        self.active_security_kind = policy.security_kind();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_status_is_unlocked_and_empty() {
        let status = SessionStatus::initial(UnlockPolicy::BIOMETRIC);
        assert!(!status.locked);
        assert!(status.empty);
        assert!(status.secret.is_none());
        assert!(status.biometrics_enabled);
        assert_eq!(status.state(), VaultState::UnlockedEmpty);
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = SessionSecret::new("super-secret-token");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_sentinel_differs_from_absent() {
        let mut status = SessionStatus::initial(UnlockPolicy::BIOMETRIC);
        assert_eq!(status.secret(), None);

        status.secret = Some(SessionSecret::sentinel());
        assert_eq!(status.secret(), Some(""));
        assert!(status.secret.as_ref().is_some_and(SessionSecret::is_sentinel));
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let mut status = SessionStatus::initial(UnlockPolicy::MemoryOnly);
        status.secret = Some(SessionSecret::new("tok1"));
        status.empty = false;

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["secret"], "tok1");
        assert_eq!(json["activePolicy"], "memoryOnly");
        assert_eq!(json["activeSecurityKind"], "none");
        assert_eq!(json["biometricsEnabled"], true);
    }
}
