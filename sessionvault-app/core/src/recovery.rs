//! Credential-invalidation recovery.
//!
//! When the device credential that protects the vault changes (a fingerprint
//! added or removed), the stored key material is gone for good. The worker
//! wipes the vault and hands off to [`RecoveryHandler`], which tells the user
//! and sends them back to login.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use sessionvault_platform::{VaultError, VaultErrorCode};
use tracing::{debug, info};

/// Keystore message observed when biometric enrollment changed on Android.
const KEYSTORE_INVALIDATION_SIGNATURE: &str = "key permanently invalidated";

/// How long the recovery notice stays on screen.
pub const RECOVERY_NOTICE_DURATION: Duration = Duration::from_millis(3000);

/// What to do about a backend error event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// Stored material is unusable: wipe and force re-authentication.
    CredentialInvalidated,
    /// Keystore error that does not look like an invalidation. Logged only,
    /// wiping on every platform hiccup would lose sessions for nothing.
    UnconfirmedKeystoreError,
    /// Anything else. Logged only.
    Unhandled,
}

/// Classify a backend error event. Each error gets exactly one disposition.
pub fn classify(error: &VaultError) -> ErrorDisposition {
    match error.code {
        VaultErrorCode::InvalidatedCredential => ErrorDisposition::CredentialInvalidated,
        VaultErrorCode::AndroidUnexpectedKeystoreError => {
            if error
                .message
                .to_ascii_lowercase()
                .contains(KEYSTORE_INVALIDATION_SIGNATURE)
            {
                ErrorDisposition::CredentialInvalidated
            } else {
                ErrorDisposition::UnconfirmedKeystoreError
            }
        }
        _ => ErrorDisposition::Unhandled,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticePosition {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeSeverity {
    Info,
    Warning,
    Danger,
}

/// A transient, auto-dismissing message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub header: String,
    pub message: String,
    pub icon: String,
    pub position: NoticePosition,
    pub severity: NoticeSeverity,
    pub duration: Duration,
}

impl Notice {
    /// Shown after the vault was wiped because biometrics changed.
    pub fn altered_biometrics() -> Self {
        Self {
            header: "Altered Biometrics".to_string(),
            message: "Please login again".to_string(),
            icon: "finger-print".to_string(),
            position: NoticePosition::Top,
            severity: NoticeSeverity::Danger,
            duration: RECOVERY_NOTICE_DURATION,
        }
    }
}

/// Screens the core can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Login,
    Home,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Home => "/home",
        }
    }
}

/// UI seam driven by recovery.
#[async_trait]
pub trait Presenter: Send + Sync {
    async fn present_notice(&self, notice: Notice);
    async fn navigate(&self, route: Route);
}

/// Notifies the user and forces re-authentication after a vault wipe.
#[derive(Clone)]
pub struct RecoveryHandler {
    presenter: Arc<dyn Presenter>,
}

impl RecoveryHandler {
    pub fn new(presenter: Arc<dyn Presenter>) -> Self {
        Self { presenter }
    }

    /// Start the re-authentication flow. Returns immediately; the UI work runs
    /// on its own task so event handling is never held up by it.
    pub fn credential_invalidated(&self) {
        info!("Credential invalidated, sending user to {}", Route::Login.path());
        let presenter = self.presenter.clone();
        tokio::spawn(async move {
            presenter.present_notice(Notice::altered_biometrics()).await;
            presenter.navigate(Route::Login).await;
            debug!("Re-authentication flow dispatched");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingPresenter, UiAction};

    #[test]
    fn test_invalidated_credential_is_destructive() {
        let err = VaultError::invalidated();
        assert_eq!(classify(&err), ErrorDisposition::CredentialInvalidated);
    }

    #[test]
    fn test_keystore_signature_match_is_case_insensitive() {
        let err = VaultError::new(
            VaultErrorCode::AndroidUnexpectedKeystoreError,
            "android.security.keystore.KeyPermanentlyInvalidatedException: Key Permanently Invalidated",
        );
        assert_eq!(classify(&err), ErrorDisposition::CredentialInvalidated);
    }

    #[test]
    fn test_unrelated_keystore_error_is_not_destructive() {
        let err = VaultError::new(
            VaultErrorCode::AndroidUnexpectedKeystoreError,
            "unrelated failure",
        );
        assert_eq!(classify(&err), ErrorDisposition::UnconfirmedKeystoreError);
    }

    #[test]
    fn test_other_codes_are_unhandled() {
        let err = VaultError::cancelled();
        assert_eq!(classify(&err), ErrorDisposition::Unhandled);
    }

    #[test]
    fn test_altered_biometrics_notice() {
        let notice = Notice::altered_biometrics();
        assert_eq!(notice.header, "Altered Biometrics");
        assert_eq!(notice.severity, NoticeSeverity::Danger);
        assert_eq!(notice.duration, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_recovery_presents_notice_then_navigates() {
        let (presenter, mut actions) = RecordingPresenter::new();
        let handler = RecoveryHandler::new(presenter);

        handler.credential_invalidated();

        assert_eq!(
            actions.recv().await,
            Some(UiAction::Notice(Notice::altered_biometrics()))
        );
        assert_eq!(actions.recv().await, Some(UiAction::Navigate(Route::Login)));
    }
}
