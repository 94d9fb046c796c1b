//! Host/guest bridge and settings synchronizer for the notepin overlay
//!
//! The host process owns the persisted settings, overlay window and global
//! hotkey and exposes them as `app` and `settings` objects. Guest code reaches
//! those objects through a [`bridge::BridgeClient`] and edits settings through
//! the shared [`settings::SettingsStore`].

#![forbid(unsafe_code)]

pub mod bridge;
pub mod capabilities;
pub mod config;
pub mod constants;
pub mod debounce;
pub mod guest;
pub mod host;
pub mod hotkeys;
pub mod ipc;
pub mod settings;
