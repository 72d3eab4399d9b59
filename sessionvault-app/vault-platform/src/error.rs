//! Error types reported by vault backends.
//!
//! Backends report failures as a [`VaultError`]: a machine-readable
//! [`VaultErrorCode`] plus the platform's free-form message. The same value is
//! returned from direct calls and carried by [`crate::VaultEvent::Error`].

use serde::{Deserialize, Serialize};

/// Result type alias for backend operations.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Classified failure codes a backend can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VaultErrorCode {
    /// Unclassified platform failure.
    Unknown,
    /// Biometric unlock requested but no biometrics are enabled for the app.
    BiometricsNotEnabled,
    /// Device credential enrollment changed; stored key material is unusable.
    InvalidatedCredential,
    /// The backend was called with arguments it cannot accept.
    InvalidArguments,
    /// No entry exists under the requested key.
    KeyNotFound,
    /// The device has no secure hardware or no credential configured.
    SecurityNotAvailable,
    /// The user failed device authentication.
    AuthFailed,
    /// Too many failed unlock attempts.
    TooManyFailedAttempts,
    /// The user dismissed the credential prompt.
    UserCanceledInteraction,
    /// Passcode confirmation did not match.
    MismatchedPasscode,
    /// The operation requires an unlocked vault.
    VaultLocked,
    /// Android keystore raised an unexpected error. Sometimes this is a
    /// permanently invalidated key, sometimes an unrelated hiccup.
    AndroidUnexpectedKeystoreError,
    /// iOS keychain raised an unexpected error.
    IosUnexpectedKeychainError,
}

impl std::fmt::Display for VaultErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unknown => "UNKNOWN",
            Self::BiometricsNotEnabled => "BIOMETRICS_NOT_ENABLED",
            Self::InvalidatedCredential => "INVALIDATED_CREDENTIAL",
            Self::InvalidArguments => "INVALID_ARGUMENTS",
            Self::KeyNotFound => "KEY_NOT_FOUND",
            Self::SecurityNotAvailable => "SECURITY_NOT_AVAILABLE",
            Self::AuthFailed => "AUTH_FAILED",
            Self::TooManyFailedAttempts => "TOO_MANY_FAILED_ATTEMPTS",
            Self::UserCanceledInteraction => "USER_CANCELED_INTERACTION",
            Self::MismatchedPasscode => "MISMATCHED_PASSCODE",
            Self::VaultLocked => "VAULT_LOCKED",
            Self::AndroidUnexpectedKeystoreError => "ANDROID_UNEXPECTED_KEYSTORE_ERROR",
            Self::IosUnexpectedKeychainError => "IOS_UNEXPECTED_KEYCHAIN_ERROR",
        };
        f.write_str(name)
    }
}

/// A failure reported by a vault backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct VaultError {
    /// What kind of failure this is.
    pub code: VaultErrorCode,
    /// Platform-provided detail. Only used for logging and message heuristics.
    pub message: String,
}

impl VaultError {
    /// Create a new error with the given code and message.
    pub fn new(code: VaultErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Shorthand for a user-cancelled credential prompt.
    pub fn cancelled() -> Self {
        Self::new(
            VaultErrorCode::UserCanceledInteraction,
            "User cancelled authentication",
        )
    }

    /// Shorthand for an invalidated device credential.
    pub fn invalidated() -> Self {
        Self::new(
            VaultErrorCode::InvalidatedCredential,
            "Biometric enrollment changed - stored secrets are now inaccessible",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_code_and_message() {
        let err = VaultError::new(VaultErrorCode::AuthFailed, "fingerprint not recognized");
        assert_eq!(err.to_string(), "AUTH_FAILED: fingerprint not recognized");
    }

    #[test]
    fn test_error_code_serialization_matches_display() {
        let json = serde_json::to_string(&VaultErrorCode::AndroidUnexpectedKeystoreError).unwrap();
        assert_eq!(json, "\"ANDROID_UNEXPECTED_KEYSTORE_ERROR\"");
        assert_eq!(
            VaultErrorCode::AndroidUnexpectedKeystoreError.to_string(),
            "ANDROID_UNEXPECTED_KEYSTORE_ERROR"
        );
    }
}
