//! Persisted settings record, field-level edits and strict partial updates

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::constants::transparency;
use crate::hotkeys::HotkeyKey;

/// Presentation theme applied to the rendering surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Light, Theme::Dark, Theme::Auto];

    /// Value written to the document-level `data-theme` attribute
    pub fn attribute(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Auto => "auto",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
            Theme::Auto => "Auto",
        };
        f.write_str(name)
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Theme::ALL
            .into_iter()
            .find(|theme| theme.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("Unknown theme '{s}' (expected Light, Dark or Auto)"))
    }
}

/// Settings record shared by host and guest
///
/// Unknown keys are ignored and missing keys take their defaults, so older or
/// newer files still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AppSettings {
    pub enable_notifications: bool,
    pub open_on_launch: bool,
    #[serde(deserialize_with = "deserialize_lenient_theme")]
    pub theme: Theme,
    pub transparency: f64,
    pub hotkey_modifiers: String,
    pub hotkey_key: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            enable_notifications: true,
            open_on_launch: false,
            theme: Theme::Auto,
            transparency: 0.95,
            hotkey_modifiers: "Control".to_string(),
            hotkey_key: "Space".to_string(),
        }
    }
}

/// Accepts any theme string, reading unrecognized values as `Auto`
fn deserialize_lenient_theme<'de, D>(deserializer: D) -> Result<Theme, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.parse().unwrap_or_else(|_| {
        warn!(theme = %raw, "Unknown theme in settings, using Auto");
        Theme::Auto
    }))
}

/// Clamp a transparency value into its valid range
///
/// Non-numeric input falls back to the default level.
pub fn clamp_transparency(value: f64) -> f64 {
    if value.is_nan() {
        return AppSettings::default().transparency;
    }
    value.clamp(transparency::MIN, transparency::MAX)
}

impl AppSettings {
    /// Correct out-of-range values in place, logging each correction
    pub fn validate_and_clamp(&mut self) {
        let clamped = clamp_transparency(self.transparency);
        if clamped != self.transparency {
            warn!(transparency = self.transparency, using = clamped, "transparency out of range, clamping");
            self.transparency = clamped;
        }

        if self.hotkey_key.parse::<HotkeyKey>().is_err() {
            warn!(hotkey_key = %self.hotkey_key, "Unknown hotkey key, it will register as Space");
        }
    }

    /// Apply one field edit, returning whether the record changed
    pub fn apply(&mut self, change: &SettingChange) -> bool {
        fn assign<T: PartialEq + Clone>(slot: &mut T, value: &T) -> bool {
            if slot == value {
                return false;
            }
            *slot = value.clone();
            true
        }

        match change {
            SettingChange::EnableNotifications(v) => assign(&mut self.enable_notifications, v),
            SettingChange::OpenOnLaunch(v) => assign(&mut self.open_on_launch, v),
            SettingChange::Theme(v) => assign(&mut self.theme, v),
            SettingChange::Transparency(v) => assign(&mut self.transparency, &clamp_transparency(*v)),
            SettingChange::HotkeyModifiers(v) => assign(&mut self.hotkey_modifiers, v),
            SettingChange::HotkeyKey(v) => assign(&mut self.hotkey_key, v),
        }
    }

    /// Merge the present fields of a partial update
    pub fn merge(&mut self, patch: SettingsPatch) {
        for change in patch.into_changes() {
            self.apply(&change);
        }
    }
}

/// A single field edit
#[derive(Debug, Clone, PartialEq)]
pub enum SettingChange {
    EnableNotifications(bool),
    OpenOnLaunch(bool),
    Theme(Theme),
    Transparency(f64),
    HotkeyModifiers(String),
    HotkeyKey(String),
}

impl SettingChange {
    /// Parse a `field` / `value` pair as typed on the command line
    ///
    /// Field names are matched case-insensitively.
    pub fn parse(field: &str, value: &str) -> Result<Self> {
        let value = value.trim();
        let change = match field.trim().to_ascii_lowercase().as_str() {
            "enablenotifications" => SettingChange::EnableNotifications(parse_bool(value)?),
            "openonlaunch" => SettingChange::OpenOnLaunch(parse_bool(value)?),
            "theme" => SettingChange::Theme(value.parse()?),
            "transparency" => SettingChange::Transparency(
                value
                    .parse()
                    .map_err(|_| anyhow!("Transparency must be a number, got '{value}'"))?,
            ),
            "hotkeymodifiers" => SettingChange::HotkeyModifiers(value.to_string()),
            "hotkeykey" => {
                value.parse::<HotkeyKey>()?;
                SettingChange::HotkeyKey(value.to_string())
            }
            other => bail!("Unknown setting '{other}'"),
        };
        Ok(change)
    }

    /// Persisted field name
    pub fn field(&self) -> &'static str {
        match self {
            SettingChange::EnableNotifications(_) => "EnableNotifications",
            SettingChange::OpenOnLaunch(_) => "OpenOnLaunch",
            SettingChange::Theme(_) => "Theme",
            SettingChange::Transparency(_) => "Transparency",
            SettingChange::HotkeyModifiers(_) => "HotkeyModifiers",
            SettingChange::HotkeyKey(_) => "HotkeyKey",
        }
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => bail!("Expected a boolean, got '{value}'"),
    }
}

/// Partial settings update as received by the host
///
/// Every field is optional; unknown keys and wrongly typed values are rejected
/// rather than coerced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_on_launch: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey_modifiers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey_key: Option<String>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == SettingsPatch::default()
    }

    pub fn into_changes(self) -> Vec<SettingChange> {
        let mut changes = Vec::new();
        if let Some(v) = self.enable_notifications {
            changes.push(SettingChange::EnableNotifications(v));
        }
        if let Some(v) = self.open_on_launch {
            changes.push(SettingChange::OpenOnLaunch(v));
        }
        if let Some(v) = self.theme {
            changes.push(SettingChange::Theme(v));
        }
        if let Some(v) = self.transparency {
            changes.push(SettingChange::Transparency(v));
        }
        if let Some(v) = self.hotkey_modifiers {
            changes.push(SettingChange::HotkeyModifiers(v));
        }
        if let Some(v) = self.hotkey_key {
            changes.push(SettingChange::HotkeyKey(v));
        }
        changes
    }
}

impl From<&AppSettings> for SettingsPatch {
    fn from(settings: &AppSettings) -> Self {
        Self {
            enable_notifications: Some(settings.enable_notifications),
            open_on_launch: Some(settings.open_on_launch),
            theme: Some(settings.theme),
            transparency: Some(settings.transparency),
            hotkey_modifiers: Some(settings.hotkey_modifiers.clone()),
            hotkey_key: Some(settings.hotkey_key.clone()),
        }
    }
}
