use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::info;

use super::{expect_args, into_envelope, lock, HostCapability, HostState};
use crate::bridge::Envelope;
use crate::constants::{methods, objects};

/// The `app` object: overlay, version, hotkey and lifecycle control
pub struct AppObject {
    state: Arc<HostState>,
}

impl AppObject {
    pub fn new(state: Arc<HostState>) -> Self {
        Self { state }
    }

    fn dispatch(&self, method: &str, args: &[String]) -> Result<Option<String>> {
        match method {
            methods::SHOW_MESSAGE => {
                let [message] = expect_args::<1>(method, args)?;
                lock(&self.state.overlay).show_message(message);
            }
            methods::TOGGLE_OVERLAY => {
                expect_args::<0>(method, args)?;
                let mut overlay = lock(&self.state.overlay);
                let visible = !overlay.is_visible();
                overlay.set_visible(visible);
            }
            methods::GET_VERSION => {
                expect_args::<0>(method, args)?;
                return Ok(Some(env!("CARGO_PKG_VERSION").to_string()));
            }
            methods::QUIT_APPLICATION => {
                expect_args::<0>(method, args)?;
                self.state.request_shutdown();
            }
            methods::UPDATE_TRANSPARENCY => {
                let [payload] = expect_args::<1>(method, args)?;
                let transparency: f64 = serde_json::from_str(payload)
                    .context(format!("Invalid transparency payload '{payload}'"))?;
                lock(&self.state.overlay).set_transparency(transparency);
            }
            methods::PAUSE_HOTKEY => {
                expect_args::<0>(method, args)?;
                lock(&self.state.hotkeys).unregister();
                info!("Hotkey paused");
            }
            methods::RESUME_HOTKEY => {
                expect_args::<0>(method, args)?;
                let hotkey = self.state.register_hotkey(&self.state.settings())?;
                info!(hotkey = %hotkey, "Hotkey resumed");
            }
            other => bail!("unknown method '{other}'"),
        }
        Ok(None)
    }
}

impl HostCapability for AppObject {
    fn name(&self) -> &'static str {
        objects::APP
    }

    fn call(&self, method: &str, args: &[String]) -> Envelope {
        into_envelope(objects::APP, method, self.dispatch(method, args))
    }
}

#[cfg(test)]
mod tests {
    use crate::host::tests::headless_runtime;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_toggle_overlay_flips_visibility() {
        let runtime = headless_runtime("toggle");
        assert!(runtime.invoke("app", "ToggleOverlay", &[]).success);
        assert!(runtime.state().overlay_visible());
        assert!(runtime.invoke("app", "ToggleOverlay", &[]).success);
        assert!(!runtime.state().overlay_visible());
    }

    #[test]
    fn test_get_version_reports_crate_version() {
        let runtime = headless_runtime("version");
        let envelope = runtime.invoke("app", "GetVersion", &[]);
        assert_eq!(envelope.data.as_deref(), Some(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_update_transparency_parses_json_and_clamps() {
        let runtime = headless_runtime("transparency");
        assert!(runtime.invoke("app", "UpdateTransparency", &args(&["0.4"])).success);
        assert_eq!(runtime.state().overlay_transparency(), 0.4);

        assert!(runtime.invoke("app", "UpdateTransparency", &args(&["7"])).success);
        assert_eq!(runtime.state().overlay_transparency(), 1.0);

        let bad = runtime.invoke("app", "UpdateTransparency", &args(&["\"opaque\""]));
        assert!(!bad.success);
        assert!(bad.error.unwrap().contains("Invalid transparency payload"));
    }

    #[test]
    fn test_pause_and_resume_hotkey() {
        let runtime = headless_runtime("pause");
        assert!(runtime.invoke("app", "PauseHotkey", &[]).success);
        assert_eq!(runtime.state().registered_hotkey(), None);

        assert!(runtime.invoke("app", "ResumeHotkey", &[]).success);
        assert_eq!(
            runtime.state().registered_hotkey().unwrap().to_string(),
            "Control+Space"
        );
    }

    #[test]
    fn test_quit_requests_shutdown() {
        let runtime = headless_runtime("quit");
        assert!(!runtime.state().is_shutting_down());
        assert!(runtime.invoke("app", "QuitApplication", &[]).success);
        assert!(runtime.state().is_shutting_down());
    }

    #[test]
    fn test_bad_calls_are_error_envelopes() {
        let runtime = headless_runtime("bad-calls");

        let unknown = runtime.invoke("app", "Reboot", &[]);
        assert_eq!(unknown.error.as_deref(), Some("unknown method 'Reboot'"));

        let missing = runtime.invoke("app", "ShowMessage", &[]);
        assert_eq!(
            missing.error.as_deref(),
            Some("ShowMessage expects 1 argument(s), got 0")
        );

        let extra = runtime.invoke("app", "GetVersion", &args(&["now"]));
        assert!(!extra.success);
    }
}
