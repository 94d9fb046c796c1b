//! Host-side configuration storage
//!
//! The settings record itself lives in [`crate::settings`]; this module only
//! knows where it is kept and how it is read and written.

pub mod settings_file;

pub use settings_file::SettingsFile;
