use tracing::{error, info};

use crate::bridge::{BridgeClient, BridgeError, Capability, Expect};
use crate::constants::{methods, objects, version};

/// Wrapper for the host `app` object
#[derive(Debug, Clone)]
pub struct AppApi {
    bridge: BridgeClient,
}

impl AppApi {
    pub fn new(bridge: BridgeClient) -> Self {
        Self { bridge }
    }

    fn connector(&self) -> Option<Capability> {
        self.bridge.capability(objects::APP)
    }

    async fn call_void(&self, method: &str, args: Vec<String>) -> Result<(), BridgeError> {
        let Some(app) = self.connector() else {
            info!(method, args = ?args, "No host (dev mode), skipping call");
            return Ok(());
        };
        app.invoke(method, args, Expect::Nothing).await.map(|_| ())
    }

    /// Ask the host to display a message to the user
    pub async fn show_message(&self, message: &str) -> Result<(), BridgeError> {
        self.call_void(methods::SHOW_MESSAGE, vec![message.to_string()])
            .await
            .inspect_err(|e| error!(error = %e, "Failed to show message"))
    }

    pub async fn toggle_overlay(&self) -> Result<(), BridgeError> {
        self.call_void(methods::TOGGLE_OVERLAY, Vec::new())
            .await
            .inspect_err(|e| error!(error = %e, "Failed to toggle overlay"))
    }

    pub async fn quit_application(&self) -> Result<(), BridgeError> {
        self.call_void(methods::QUIT_APPLICATION, Vec::new())
            .await
            .inspect_err(|e| error!(error = %e, "Failed to quit application"))
    }

    /// Host version string; never fails
    ///
    /// Returns a sentinel instead: `0.0.0-dev` without a host and
    /// `0.0.0-error` when the call fails or the host sends no version.
    pub async fn get_version(&self) -> String {
        let Some(app) = self.connector() else {
            info!("No host (dev mode), reporting development version");
            return version::DEV.to_string();
        };

        let result = app
            .invoke(methods::GET_VERSION, Vec::new(), Expect::Value)
            .await
            .and_then(|v| v.ok_or(BridgeError::NoData));
        match result {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "Failed to get version");
                version::ERROR.to_string()
            }
        }
    }

    /// Preview an overlay transparency level without persisting it
    ///
    /// Best effort: failures are logged and swallowed.
    pub async fn update_transparency_preview(&self, transparency: f64) {
        let payload = match serde_json::to_string(&transparency) {
            Ok(payload) => payload,
            Err(e) => {
                error!(transparency, error = %e, "Failed to encode transparency");
                return;
            }
        };
        if let Err(e) = self.call_void(methods::UPDATE_TRANSPARENCY, vec![payload]).await {
            error!(transparency, error = %e, "Failed to update overlay transparency");
        }
    }

    /// Suspend the global hotkey, e.g. while a new one is being recorded
    pub async fn pause_hotkey(&self) {
        if let Err(e) = self.call_void(methods::PAUSE_HOTKEY, Vec::new()).await {
            error!(error = %e, "Failed to pause hotkey");
        }
    }

    pub async fn resume_hotkey(&self) {
        if let Err(e) = self.call_void(methods::RESUME_HOTKEY, Vec::new()).await {
            error!(error = %e, "Failed to resume hotkey");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::tests::{scripted_client, ScriptedHost};
    use crate::bridge::Envelope;

    #[tokio::test]
    async fn test_absent_bridge_uses_dev_fallbacks() {
        let app = AppApi::new(BridgeClient::absent());

        assert_eq!(app.get_version().await, "0.0.0-dev");
        app.show_message("hello").await.unwrap();
        app.toggle_overlay().await.unwrap();
        app.quit_application().await.unwrap();
        app.update_transparency_preview(0.5).await;
        app.pause_hotkey().await;
        app.resume_hotkey().await;
    }

    #[tokio::test]
    async fn test_missing_app_object_is_dev_mode() {
        let (client, host) = scripted_client(ScriptedHost::default(), vec!["settings"]);
        let app = AppApi::new(client);

        assert_eq!(app.get_version().await, "0.0.0-dev");
        assert!(host.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_version_sentinels() {
        let (client, _) = scripted_client(
            ScriptedHost::default().reply("app", "GetVersion", Envelope::with_data("1.2.3")),
            vec!["app"],
        );
        assert_eq!(AppApi::new(client).get_version().await, "1.2.3");

        let (client, _) = scripted_client(
            ScriptedHost::default().reply("app", "GetVersion", Envelope::ok()),
            vec!["app"],
        );
        assert_eq!(AppApi::new(client).get_version().await, "0.0.0-error");

        let (client, _) = scripted_client(
            ScriptedHost::default().reply("app", "GetVersion", Envelope::with_data("")),
            vec!["app"],
        );
        assert_eq!(AppApi::new(client).get_version().await, "0.0.0-error");

        let (client, _) = scripted_client(
            ScriptedHost::default().reply("app", "GetVersion", Envelope::failure("boom")),
            vec!["app"],
        );
        assert_eq!(AppApi::new(client).get_version().await, "0.0.0-error");
    }

    #[tokio::test]
    async fn test_transparency_preview_sends_json_and_swallows_failure() {
        let (client, host) = scripted_client(
            ScriptedHost::default().reply("app", "UpdateTransparency", Envelope::failure("no overlay")),
            vec!["app"],
        );
        AppApi::new(client).update_transparency_preview(0.25).await;

        let calls = host.calls.lock().unwrap();
        assert_eq!(calls[0].1, "UpdateTransparency");
        assert_eq!(calls[0].2, vec!["0.25".to_string()]);
    }

    #[tokio::test]
    async fn test_toggle_failure_propagates() {
        let (client, _) = scripted_client(
            ScriptedHost::default().reply("app", "ToggleOverlay", Envelope::failure("hidden window gone")),
            vec!["app"],
        );
        let err = AppApi::new(client).toggle_overlay().await.unwrap_err();
        assert_eq!(err.to_string(), "hidden window gone");
    }
}
