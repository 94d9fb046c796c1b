//! Settings record and the guest-side synchronizer

mod record;
mod store;
mod theme;

pub use record::{clamp_transparency, AppSettings, SettingChange, SettingsPatch, Theme};
pub use store::{SettingsStore, SyncState};
pub use theme::{DocumentTheme, ThemeApplier};
