//! Host process: capability objects over shared host state
//!
//! The host owns the persisted settings, the overlay window and the global
//! hotkey. Guests reach them only through the `app` and `settings` objects,
//! whose methods always answer with an [`Envelope`].

mod app;
mod overlay;
pub mod server;
mod settings;

pub use overlay::{HeadlessOverlay, OverlayWindow};

use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::bridge::Envelope;
use crate::config::SettingsFile;
use crate::hotkeys::{HeadlessHotkeys, Hotkey, HotkeyRegistrar};
use crate::settings::AppSettings;

/// A named object whose methods the guest may call
pub trait HostCapability: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run a method; failures come back as an error envelope
    fn call(&self, method: &str, args: &[String]) -> Envelope;
}

/// Turn a method outcome into its envelope
fn into_envelope(object: &str, method: &str, result: Result<Option<String>>) -> Envelope {
    match result {
        Ok(Some(data)) => Envelope::with_data(data),
        Ok(None) => Envelope::ok(),
        Err(e) => {
            error!(object, method, error = %e, "Host method failed");
            Envelope::failure(format!("{e:#}"))
        }
    }
}

/// Check the argument count of a method call
fn expect_args<'a, const N: usize>(method: &str, args: &'a [String]) -> Result<&'a [String; N]> {
    args.try_into().map_err(|_| {
        anyhow!(
            "{} expects {} argument(s), got {}",
            method,
            N,
            args.len()
        )
    })
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

/// State shared by every host object
pub struct HostState {
    settings: Mutex<AppSettings>,
    overlay: Mutex<Box<dyn OverlayWindow>>,
    hotkeys: Mutex<Box<dyn HotkeyRegistrar>>,
    file: SettingsFile,
    shutdown: watch::Sender<bool>,
}

impl HostState {
    /// Snapshot of the in-memory settings
    pub fn settings(&self) -> AppSettings {
        lock(&self.settings).clone()
    }

    pub fn overlay_visible(&self) -> bool {
        lock(&self.overlay).is_visible()
    }

    pub fn overlay_transparency(&self) -> f64 {
        lock(&self.overlay).transparency()
    }

    pub fn registered_hotkey(&self) -> Option<Hotkey> {
        lock(&self.hotkeys).registered()
    }

    pub fn file(&self) -> &SettingsFile {
        &self.file
    }

    /// Register the hotkey described by `settings`, replacing any active one
    fn register_hotkey(&self, settings: &AppSettings) -> Result<Hotkey> {
        let hotkey = Hotkey::from_settings(&settings.hotkey_modifiers, &settings.hotkey_key);
        let mut hotkeys = lock(&self.hotkeys);
        hotkeys.unregister();
        hotkeys.register(hotkey)?;
        Ok(hotkey)
    }

    pub fn request_shutdown(&self) {
        info!("Shutdown requested");
        self.shutdown.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Hide the overlay and drop the hotkey before exit
    pub fn release_resources(&self) {
        lock(&self.hotkeys).unregister();
        lock(&self.overlay).set_visible(false);
    }
}

/// The host's object registry
pub struct HostRuntime {
    state: Arc<HostState>,
    objects: Vec<Arc<dyn HostCapability>>,
}

impl HostRuntime {
    /// Load settings, register the hotkey and apply the overlay settings
    pub fn start(
        file: SettingsFile,
        mut overlay: Box<dyn OverlayWindow>,
        hotkeys: Box<dyn HotkeyRegistrar>,
    ) -> Self {
        let settings = file.load_or_create();
        info!(path = %file.path().display(), settings = ?settings, "Host settings loaded");

        overlay.set_transparency(settings.transparency);
        if settings.open_on_launch {
            overlay.set_visible(true);
        }

        let state = Arc::new(HostState {
            settings: Mutex::new(settings.clone()),
            overlay: Mutex::new(overlay),
            hotkeys: Mutex::new(hotkeys),
            file,
            shutdown: watch::channel(false).0,
        });

        if let Err(e) = state.register_hotkey(&settings) {
            warn!(error = %e, "Failed to register hotkey, continuing without it");
        }

        let objects: Vec<Arc<dyn HostCapability>> = vec![
            Arc::new(app::AppObject::new(Arc::clone(&state))),
            Arc::new(settings::SettingsObject::new(Arc::clone(&state))),
        ];

        Self { state, objects }
    }

    /// Runtime with a headless overlay and hotkey registrar
    pub fn headless(file: SettingsFile) -> Self {
        Self::start(
            file,
            Box::new(HeadlessOverlay::new(AppSettings::default().transparency)),
            Box::new(HeadlessHotkeys::default()),
        )
    }

    pub fn state(&self) -> &Arc<HostState> {
        &self.state
    }

    pub fn object_names(&self) -> Vec<String> {
        self.objects.iter().map(|o| o.name().to_string()).collect()
    }

    pub fn object(&self, name: &str) -> Option<Arc<dyn HostCapability>> {
        self.objects.iter().find(|o| o.name() == name).cloned()
    }

    /// Call `object.method(args)`; an unknown object yields an error envelope
    pub fn invoke(&self, object: &str, method: &str, args: &[String]) -> Envelope {
        match self.object(object) {
            Some(target) => target.call(method, args),
            None => {
                warn!(object, method, "Call to unknown host object");
                Envelope::failure(format!("unknown host object '{object}'"))
            }
        }
    }
}
