//! Typed wrappers over the host capabilities
//!
//! Each wrapper degrades to a logged no-op with a success-shaped result when
//! its host object is absent, so guest code runs unchanged outside the host.

mod app;
mod settings;
mod version;

pub use app::AppApi;
pub use settings::SettingsApi;
pub use version::AppVersion;
