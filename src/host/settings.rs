use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use super::{expect_args, into_envelope, lock, HostCapability, HostState};
use crate::bridge::Envelope;
use crate::constants::{methods, objects};
use crate::settings::SettingsPatch;

/// The `settings` object: read and persist the settings record
pub struct SettingsObject {
    state: Arc<HostState>,
}

impl SettingsObject {
    pub fn new(state: Arc<HostState>) -> Self {
        Self { state }
    }

    fn update(&self, payload: &str) -> Result<()> {
        let patch: SettingsPatch =
            serde_json::from_str(payload).context("Invalid settings payload")?;
        if patch.is_empty() {
            info!("Empty settings update, saving unchanged record");
        }

        let (previous, updated) = {
            let mut settings = lock(&self.state.settings);
            let mut updated = settings.clone();
            updated.merge(patch);
            updated.validate_and_clamp();

            self.state
                .file
                .save(&updated)
                .context("Failed to persist settings")?;
            let previous = std::mem::replace(&mut *settings, updated.clone());
            (previous, updated)
        };

        if previous.hotkey_modifiers != updated.hotkey_modifiers
            || previous.hotkey_key != updated.hotkey_key
        {
            match self.state.register_hotkey(&updated) {
                Ok(hotkey) => info!(hotkey = %hotkey, "Hotkey re-registered"),
                Err(e) => warn!(error = %e, "Failed to re-register hotkey"),
            }
        }

        lock(&self.state.overlay).set_transparency(updated.transparency);
        info!(settings = ?updated, "Settings updated");
        Ok(())
    }

    fn dispatch(&self, method: &str, args: &[String]) -> Result<Option<String>> {
        match method {
            methods::GET_SETTINGS => {
                expect_args::<0>(method, args)?;
                let json = serde_json::to_string(&self.state.settings())?;
                Ok(Some(json))
            }
            methods::UPDATE_SETTINGS => {
                let [payload] = expect_args::<1>(method, args)?;
                self.update(payload)?;
                Ok(None)
            }
            other => bail!("unknown method '{other}'"),
        }
    }
}

impl HostCapability for SettingsObject {
    fn name(&self) -> &'static str {
        objects::SETTINGS
    }

    fn call(&self, method: &str, args: &[String]) -> Envelope {
        into_envelope(objects::SETTINGS, method, self.dispatch(method, args))
    }
}

#[cfg(test)]
mod tests {
    use crate::host::tests::headless_runtime;
    use crate::settings::{AppSettings, Theme};
    use pretty_assertions::assert_eq;

    fn update(payload: &str) -> Vec<String> {
        vec![payload.to_string()]
    }

    #[test]
    fn test_get_settings_returns_record_json() {
        let runtime = headless_runtime("get-settings");
        let envelope = runtime.invoke("settings", "GetSettings", &[]);

        let record: AppSettings = serde_json::from_str(&envelope.data.unwrap()).unwrap();
        assert_eq!(record, AppSettings::default());
    }

    #[test]
    fn test_update_persists_and_applies() {
        let runtime = headless_runtime("update");
        let envelope = runtime.invoke(
            "settings",
            "UpdateSettings",
            &update(r#"{"Theme":"Dark","Transparency":0.7,"HotkeyKey":"F9"}"#),
        );
        assert!(envelope.success, "{:?}", envelope.error);

        let state = runtime.state();
        let settings = state.settings();
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.transparency, 0.7);
        assert_eq!(state.file().load_or_create(), settings);
        assert_eq!(state.overlay_transparency(), 0.7);
        assert_eq!(state.registered_hotkey().unwrap().to_string(), "Control+F9");
    }

    #[test]
    fn test_update_clamps_transparency() {
        let runtime = headless_runtime("update-clamp");
        runtime.invoke("settings", "UpdateSettings", &update(r#"{"Transparency":1.5}"#));
        assert_eq!(runtime.state().settings().transparency, 1.0);
    }

    #[test]
    fn test_update_rejects_unknown_and_mistyped_fields() {
        let runtime = headless_runtime("update-strict");

        let unknown = runtime.invoke("settings", "UpdateSettings", &update(r#"{"FontSize":12}"#));
        assert!(!unknown.success);
        assert!(unknown.error.unwrap().starts_with("Invalid settings payload"));

        let mistyped =
            runtime.invoke("settings", "UpdateSettings", &update(r#"{"OpenOnLaunch":"yes"}"#));
        assert!(!mistyped.success);

        assert_eq!(runtime.state().settings(), AppSettings::default());
    }

    #[test]
    fn test_persistence_failure_leaves_state_unchanged() {
        let runtime = headless_runtime("update-readonly");
        let path = runtime.state().file().path().to_path_buf();
        // A directory where the file should be makes the write fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir_all(&path).unwrap();

        let envelope =
            runtime.invoke("settings", "UpdateSettings", &update(r#"{"OpenOnLaunch":true}"#));
        assert!(!envelope.success);
        assert!(envelope.error.unwrap().starts_with("Failed to persist settings"));
        assert!(!runtime.state().settings().open_on_launch);
    }
}
