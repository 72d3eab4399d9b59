//! In-memory doubles for the backend and presenter.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sessionvault_platform::{VaultBackend, VaultConfig, VaultError, VaultEvent};
use tokio::sync::{broadcast, mpsc};

use crate::recovery::{Notice, Presenter, Route};

#[derive(Default)]
struct FakeState {
    config: VaultConfig,
    value: Option<String>,
    locked: bool,
    fail_next_get: Option<VaultError>,
    fail_next_update: Option<VaultError>,
    update_calls: usize,
    clear_calls: usize,
}

/// Backend that behaves like a platform vault with a prompt that always
/// succeeds, unless told to fail the next call.
pub(crate) struct FakeBackend {
    state: Mutex<FakeState>,
    events: broadcast::Sender<VaultEvent>,
}

impl FakeBackend {
    pub fn new(config: VaultConfig) -> Arc<Self> {
        let (events, _) = broadcast::channel(32);
        Arc::new(Self {
            state: Mutex::new(FakeState {
                config,
                ..Default::default()
            }),
            events,
        })
    }

    pub fn emit(&self, event: VaultEvent) {
        let _ = self.events.send(event);
    }

    pub fn fail_next_get(&self, error: VaultError) {
        self.state.lock().unwrap().fail_next_get = Some(error);
    }

    pub fn fail_next_update(&self, error: VaultError) {
        self.state.lock().unwrap().fail_next_update = Some(error);
    }

    /// Platform-side lock, as after an auto-lock timeout.
    pub fn lock_from_platform(&self) {
        self.state.lock().unwrap().locked = true;
        self.emit(VaultEvent::Locked);
    }

    /// Platform-side unlock, as after a prompt raised elsewhere.
    pub fn unlock_from_platform(&self) {
        self.state.lock().unwrap().locked = false;
        self.emit(VaultEvent::Unlocked);
    }

    /// Memory-only storage lost in the background, with no event.
    pub fn wipe_silently(&self) {
        self.state.lock().unwrap().value = None;
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    pub fn update_calls(&self) -> usize {
        self.state.lock().unwrap().update_calls
    }

    pub fn clear_calls(&self) -> usize {
        self.state.lock().unwrap().clear_calls
    }

    pub fn stored_value(&self) -> Option<String> {
        self.state.lock().unwrap().value.clone()
    }

    fn unlock_if_locked(&self) {
        let was_locked = std::mem::replace(&mut self.state.lock().unwrap().locked, false);
        if was_locked {
            self.emit(VaultEvent::Unlocked);
        }
    }
}

#[async_trait]
impl VaultBackend for FakeBackend {
    async fn config(&self) -> VaultConfig {
        self.state.lock().unwrap().config.clone()
    }

    async fn update_config(&self, config: VaultConfig) -> Result<(), VaultError> {
        {
            let mut state = self.state.lock().unwrap();
            state.update_calls += 1;
            if let Some(error) = state.fail_next_update.take() {
                return Err(error);
            }
            state.config = config.clone();
        }
        self.emit(VaultEvent::ConfigChanged(config));
        Ok(())
    }

    async fn set_value(&self, _key: &str, value: &str) -> Result<(), VaultError> {
        self.unlock_if_locked();
        self.state.lock().unwrap().value = Some(value.to_string());
        Ok(())
    }

    async fn get_value(&self, _key: &str) -> Result<Option<String>, VaultError> {
        if let Some(error) = self.state.lock().unwrap().fail_next_get.take() {
            return Err(error);
        }
        self.unlock_if_locked();
        Ok(self.state.lock().unwrap().value.clone())
    }

    async fn is_empty(&self) -> Result<bool, VaultError> {
        Ok(self.state.lock().unwrap().value.is_none())
    }

    async fn is_locked(&self) -> Result<bool, VaultError> {
        Ok(self.state.lock().unwrap().locked)
    }

    async fn lock(&self) -> Result<(), VaultError> {
        let memory_only = {
            let mut state = self.state.lock().unwrap();
            if state.config.unlock_policy.is_memory_only() {
                state.value = None;
                true
            } else {
                state.locked = true;
                false
            }
        };
        if !memory_only {
            self.emit(VaultEvent::Locked);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), VaultError> {
        let mut state = self.state.lock().unwrap();
        state.clear_calls += 1;
        state.value = None;
        state.locked = false;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<VaultEvent> {
        self.events.subscribe()
    }
}

/// What the presenter was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UiAction {
    Notice(Notice),
    Navigate(Route),
}

pub(crate) struct RecordingPresenter {
    actions: mpsc::UnboundedSender<UiAction>,
}

impl RecordingPresenter {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<UiAction>) {
        let (actions, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { actions }), rx)
    }
}

#[async_trait]
impl Presenter for RecordingPresenter {
    async fn present_notice(&self, notice: Notice) {
        let _ = self.actions.send(UiAction::Notice(notice));
    }

    async fn navigate(&self, route: Route) {
        let _ = self.actions.send(UiAction::Navigate(route));
    }
}
