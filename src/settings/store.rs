//! Editable copy of the persisted settings
//!
//! `current` is what the user is editing, `original` is the last record known
//! to be persisted. Only `load` and `save` write `original`.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::{AppSettings, SettingChange, SettingsPatch, ThemeApplier};
use crate::bridge::BridgeClient;
use crate::capabilities::{AppApi, SettingsApi};
use crate::constants::messages;
use crate::constants::transparency::PREVIEW_DEBOUNCE_MS;
use crate::debounce::{debounce_async, DebouncedAsync};

/// Progress and outcome of the last load and save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    pub loading: bool,
    pub load_error: Option<String>,
    pub saving: bool,
    pub last_save_error: Option<String>,
}

#[derive(Debug, Default)]
struct StoreInner {
    current: AppSettings,
    original: AppSettings,
    state: SyncState,
}

type PreviewDone = Shared<BoxFuture<'static, ()>>;

/// Settings synchronizer shared by every settings surface
pub struct SettingsStore {
    settings: SettingsApi,
    app: AppApi,
    theme: Arc<dyn ThemeApplier>,
    preview: DebouncedAsync<f64>,
    last_preview: Mutex<Option<PreviewDone>>,
    inner: Mutex<StoreInner>,
    revision: watch::Sender<u64>,
}

impl SettingsStore {
    pub fn new(bridge: BridgeClient, theme: Arc<dyn ThemeApplier>) -> Arc<Self> {
        let app = AppApi::new(bridge.clone());
        let preview_app = app.clone();
        let preview = debounce_async(
            move |value: f64| {
                let app = preview_app.clone();
                async move { app.update_transparency_preview(value).await }
            },
            Duration::from_millis(PREVIEW_DEBOUNCE_MS),
        );

        Arc::new(Self {
            settings: SettingsApi::new(bridge),
            app,
            theme,
            preview,
            last_preview: Mutex::new(None),
            inner: Mutex::new(StoreInner::default()),
            revision: watch::channel(0).0,
        })
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    pub fn current(&self) -> AppSettings {
        self.lock().current.clone()
    }

    pub fn original(&self) -> AppSettings {
        self.lock().original.clone()
    }

    pub fn state(&self) -> SyncState {
        self.lock().state.clone()
    }

    /// Revision counter bumped on every observable change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn has_changes(&self) -> bool {
        let inner = self.lock();
        inner.current != inner.original
    }

    /// Replace both copies with the host's record
    ///
    /// On failure the records are left untouched and `load_error` is set.
    pub async fn load(&self) {
        {
            let mut inner = self.lock();
            if inner.state.loading || inner.state.saving {
                warn!(state = ?inner.state, "Settings busy, ignoring load");
                return;
            }
            inner.state.loading = true;
            inner.state.load_error = None;
        }
        self.notify();

        let result = self.settings.get_settings().await;

        let loaded = {
            let mut inner = self.lock();
            inner.state.loading = false;
            match result {
                Ok(mut settings) => {
                    settings.validate_and_clamp();
                    inner.current = settings.clone();
                    inner.original = settings.clone();
                    Some(settings)
                }
                Err(e) => {
                    error!(error = %e, "Failed to load settings");
                    inner.state.load_error = Some(e.to_string());
                    None
                }
            }
        };

        if let Some(settings) = loaded {
            self.theme.apply(settings.theme);
            info!(settings = ?settings, "Settings loaded");
        }
        self.notify();
    }

    /// Edit one field of `current`, returning whether it changed
    ///
    /// A theme edit is applied right away. A transparency edit is clamped and
    /// previewed on the host once the slider settles; outside an async runtime
    /// the edit is kept and only the preview is skipped.
    pub fn set_field(&self, change: SettingChange) -> bool {
        let (changed, transparency) = {
            let mut inner = self.lock();
            let changed = inner.current.apply(&change);
            (changed, inner.current.transparency)
        };
        debug!(field = change.field(), changed, "Setting edited");

        match change {
            SettingChange::Theme(theme) => self.theme.apply(theme),
            SettingChange::Transparency(_) => {
                let done = self.preview.call(transparency).boxed().shared();
                *self.last_preview.lock().unwrap_or_else(|p| p.into_inner()) = Some(done);
            }
            _ => {}
        }

        if changed {
            self.notify();
        }
        changed
    }

    /// Wait for the most recent transparency preview to finish
    pub async fn preview_settled(&self) {
        let done = self
            .last_preview
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone();
        if let Some(done) = done {
            done.await;
        }
    }

    /// Persist `current` as it is when the call starts
    ///
    /// Returns `true` without contacting the host when nothing changed. On
    /// failure, including a load or save already in progress, `current`
    /// keeps its edits and `last_save_error` is set.
    pub async fn save(&self) -> bool {
        let snapshot = {
            let mut inner = self.lock();
            if inner.current == inner.original {
                info!("No changes to save");
                return true;
            }
            if inner.state.loading || inner.state.saving {
                warn!(state = ?inner.state, "Settings busy, ignoring save");
                inner.state.last_save_error = Some(messages::SETTINGS_BUSY.to_string());
                None
            } else {
                inner.state.saving = true;
                inner.state.last_save_error = None;
                Some(inner.current.clone())
            }
        };
        self.notify();
        let Some(snapshot) = snapshot else {
            return false;
        };

        let result = self
            .settings
            .try_update_settings(&SettingsPatch::from(&snapshot))
            .await;

        let saved = {
            let mut inner = self.lock();
            inner.state.saving = false;
            match result {
                Ok(()) => {
                    inner.original = snapshot;
                    true
                }
                Err(e) => {
                    error!(error = %e, "Failed to save settings");
                    inner.state.last_save_error = Some(e.to_string());
                    false
                }
            }
        };
        if saved {
            info!("Settings saved");
        }
        self.notify();
        saved
    }

    /// Drop unsaved edits and restore the host preview to the saved record
    pub async fn cancel(&self) {
        self.preview.cancel();
        let original = {
            let mut inner = self.lock();
            inner.current = inner.original.clone();
            inner.original.clone()
        };
        self.notify();

        self.theme.apply(original.theme);
        self.app.update_transparency_preview(original.transparency).await;
        info!("Settings changes cancelled");
    }
}
