use tracing::{error, info};

use crate::bridge::{BridgeClient, BridgeError, Expect};
use crate::constants::{methods, objects};
use crate::settings::{AppSettings, SettingsPatch};

/// Wrapper for the host `settings` object
#[derive(Debug, Clone)]
pub struct SettingsApi {
    bridge: BridgeClient,
}

impl SettingsApi {
    pub fn new(bridge: BridgeClient) -> Self {
        Self { bridge }
    }

    /// Read the persisted settings record
    ///
    /// Without a host this is the default record. A successful call that
    /// carries no data also reads as the default record.
    pub async fn get_settings(&self) -> Result<AppSettings, BridgeError> {
        let Some(settings) = self.bridge.capability(objects::SETTINGS) else {
            info!("No host (dev mode), using default settings");
            return Ok(AppSettings::default());
        };

        let data = settings
            .invoke(methods::GET_SETTINGS, Vec::new(), Expect::Nothing)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to get settings from host"))?;

        match data {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(AppSettings::default()),
        }
    }

    /// Persist the present fields of `patch`; `false` on any failure
    pub async fn update_settings(&self, patch: &SettingsPatch) -> bool {
        match self.try_update_settings(patch).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to update settings");
                false
            }
        }
    }

    /// Like [`update_settings`](Self::update_settings) but keeps the failure
    pub async fn try_update_settings(&self, patch: &SettingsPatch) -> Result<(), BridgeError> {
        let Some(settings) = self.bridge.capability(objects::SETTINGS) else {
            info!(patch = ?patch, "No host (dev mode), settings update skipped");
            return Ok(());
        };

        let payload = serde_json::to_string(patch)?;
        settings
            .invoke(methods::UPDATE_SETTINGS, vec![payload], Expect::Nothing)
            .await
            .map(|_| ())
    }
}
