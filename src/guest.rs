//! Guest runtime context
//!
//! One `Guest` is built at start-up and owns the bridge client and the single
//! settings store; consumers get cheap handles from it.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

use crate::bridge::ipc_host::IpcHost;
use crate::bridge::BridgeClient;
use crate::capabilities::{AppApi, AppVersion, SettingsApi};
use crate::settings::{DocumentTheme, SettingsStore};

pub struct Guest {
    bridge: BridgeClient,
    theme: Arc<DocumentTheme>,
    store: Arc<SettingsStore>,
    version: OnceCell<AppVersion>,
}

impl Guest {
    pub fn new(bridge: BridgeClient) -> Self {
        let theme = Arc::new(DocumentTheme::default());
        let store = SettingsStore::new(bridge.clone(), theme.clone());
        Self {
            bridge,
            theme,
            store,
            version: OnceCell::new(),
        }
    }

    /// Connect to the host socket, running without a host if it cannot be reached
    pub async fn connect(socket: &Path) -> Self {
        let bridge = match IpcHost::connect(socket).await {
            Ok(host) => BridgeClient::with_host(Arc::new(host)),
            Err(e) => {
                info!(socket = %socket.display(), error = %e, "Host not reachable, running in dev mode");
                BridgeClient::absent()
            }
        };
        Self::new(bridge)
    }

    pub fn bridge(&self) -> &BridgeClient {
        &self.bridge
    }

    pub fn app(&self) -> AppApi {
        AppApi::new(self.bridge.clone())
    }

    pub fn settings_api(&self) -> SettingsApi {
        SettingsApi::new(self.bridge.clone())
    }

    /// Host version, queried once and reused afterwards
    pub async fn app_version(&self) -> AppVersion {
        *self
            .version
            .get_or_init(|| async { AppVersion::parse(&self.app().get_version().await) })
            .await
    }

    pub fn store(&self) -> Arc<SettingsStore> {
        Arc::clone(&self.store)
    }

    pub fn theme(&self) -> &DocumentTheme {
        &self.theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::local::LocalHost;
    use crate::bridge::tests::{scripted_client, ScriptedHost};
    use crate::bridge::Envelope;
    use crate::host::tests::headless_runtime;
    use crate::settings::Theme;

    #[tokio::test]
    async fn test_unreachable_host_falls_back_to_dev_mode() {
        let socket = std::env::temp_dir().join(format!("notepin-nohost-{}.sock", std::process::id()));
        let guest = Guest::connect(&socket).await;

        assert!(!guest.bridge().is_available("app"));
        assert_eq!(guest.app().get_version().await, "0.0.0-dev");
    }

    #[tokio::test]
    async fn test_store_handles_share_state() {
        let runtime = Arc::new(headless_runtime("guest-shared"));
        let guest = Guest::new(BridgeClient::with_host(Arc::new(LocalHost::new(runtime))));

        let first = guest.store();
        let second = guest.store();
        first.load().await;
        first.set_field(crate::settings::SettingChange::Theme(Theme::Dark));

        assert!(second.has_changes());
        assert_eq!(guest.theme().current(), Some(Theme::Dark));
        assert_eq!(
            guest.settings_api().get_settings().await.unwrap().theme,
            Theme::Auto
        );
    }

    #[tokio::test]
    async fn test_app_version_is_queried_once() {
        let (client, host) = scripted_client(
            ScriptedHost::default().reply("app", "GetVersion", Envelope::with_data("1.4.12")),
            vec!["app"],
        );
        let guest = Guest::new(client);

        let expected = AppVersion {
            major: 1,
            minor: 4,
            build: 12,
        };
        assert_eq!(guest.app_version().await, expected);
        assert_eq!(guest.app_version().await, expected);
        assert_eq!(host.calls.lock().unwrap().len(), 1);
    }
}
