//! Login and home screens, rendered to the terminal.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use sessionvault_core::{Notice, Presenter, Route, SessionStatus, SessionVault};
use tokio::sync::watch;

/// Token handed out by the pretend login.
pub const FAKE_TOKEN: &str = "someTokenValue";

/// Prints notices and keeps track of the current screen.
pub struct TerminalPresenter {
    route: watch::Sender<Route>,
}

impl TerminalPresenter {
    pub fn new() -> (Arc<Self>, watch::Receiver<Route>) {
        let (route, rx) = watch::channel(Route::Login);
        (Arc::new(Self { route }), rx)
    }
}

#[async_trait]
impl Presenter for TerminalPresenter {
    async fn present_notice(&self, notice: Notice) {
        println!(
            "[{:?}] {}: {} ({})",
            notice.severity, notice.header, notice.message, notice.icon
        );
    }

    async fn navigate(&self, route: Route) {
        println!("=> {}", route.path());
        self.route.send_replace(route);
    }
}

pub struct LoginPage<'a> {
    vault: &'a SessionVault,
    presenter: &'a dyn Presenter,
}

impl<'a> LoginPage<'a> {
    pub fn new(vault: &'a SessionVault, presenter: &'a dyn Presenter) -> Self {
        Self { vault, presenter }
    }

    /// Pretend to log in: store a fake token and go home.
    pub async fn login(&self) -> Result<()> {
        self.vault.set_session(FAKE_TOKEN).await?;
        self.presenter.navigate(Route::Home).await;
        Ok(())
    }
}

pub struct HomePage<'a> {
    vault: &'a SessionVault,
}

impl<'a> HomePage<'a> {
    pub fn new(vault: &'a SessionVault) -> Self {
        Self { vault }
    }

    pub async fn toggle_lock(&self) -> Result<()> {
        self.vault.lock_or_restore().await?;
        Ok(())
    }

    pub async fn toggle_biometrics(&self) -> Result<()> {
        let enabled = self.vault.status().biometrics_enabled;
        self.vault.toggle_biometrics(!enabled).await?;
        Ok(())
    }

    pub async fn set_biometrics(&self, enable: bool) -> Result<()> {
        self.vault.toggle_biometrics(enable).await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.vault.clear_vault().await?;
        Ok(())
    }
}

/// One-line summary of the status for the prompt.
pub fn render_status(status: &SessionStatus) -> String {
    let secret = match status.secret() {
        None => "-".to_string(),
        Some("") => "<restore failed>".to_string(),
        Some(secret) => secret.to_string(),
    };
    format!(
        "state={} secret={} biometrics={} policy={} ({})",
        status.state(),
        secret,
        if status.biometrics_enabled { "on" } else { "off" },
        status.active_policy,
        status.active_security_kind
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sessionvault_platform::{AppLifecycle, AutoApprove, EphemeralBackend, VaultConfig};

    fn vault() -> (SessionVault, Arc<TerminalPresenter>, watch::Receiver<Route>) {
        let backend = EphemeralBackend::new(VaultConfig::default(), Arc::new(AutoApprove)).unwrap();
        let (presenter, route) = TerminalPresenter::new();
        let vault = SessionVault::new(
            Arc::new(backend),
            AppLifecycle::new(),
            presenter.clone(),
            "sessionData",
        );
        (vault, presenter, route)
    }

    #[tokio::test]
    async fn test_login_stores_token_and_goes_home() {
        let (vault, presenter, route) = vault();
        vault.initialize().await.unwrap();

        LoginPage::new(&vault, presenter.as_ref()).login().await.unwrap();

        assert_eq!(vault.status().secret(), Some(FAKE_TOKEN));
        assert_eq!(*route.borrow(), Route::Home);
    }

    #[tokio::test]
    async fn test_home_toggles() {
        let (vault, presenter, _route) = vault();
        vault.initialize().await.unwrap();
        LoginPage::new(&vault, presenter.as_ref()).login().await.unwrap();
        let home = HomePage::new(&vault);

        home.toggle_lock().await.unwrap();
        assert!(vault.status().locked);
        home.toggle_lock().await.unwrap();
        assert_eq!(vault.status().secret(), Some(FAKE_TOKEN));

        home.toggle_biometrics().await.unwrap();
        assert!(!vault.status().biometrics_enabled);
    }

    #[test]
    fn test_render_status_marks_sentinel() {
        let mut status = SessionStatus::initial(sessionvault_platform::UnlockPolicy::BIOMETRIC);
        status.secret = Some(sessionvault_core::SessionSecret::sentinel());
        assert!(render_status(&status).contains("<restore failed>"));
    }
}
