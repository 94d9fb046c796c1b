//! Application-wide constants
//!
//! This module contains all magic numbers and string literals shared by the
//! host process and the guest runtime, providing a single source of truth.

/// Settings file location
pub mod config {
    /// Directory under the platform config dir
    pub const APP_DIR: &str = "notepin";

    /// Persisted settings file name
    pub const FILENAME: &str = "settings.json";
}

/// Host socket transport
pub mod ipc {
    /// Directory under XDG_RUNTIME_DIR (or the cache dir) holding the socket
    pub const SOCKET_DIR: &str = "notepin";

    /// Socket file name
    pub const SOCKET_NAME: &str = "host.sock";

    /// Environment variable overriding the socket path
    pub const SOCKET_ENV: &str = "NOTEPIN_SOCKET";

    /// Maximum frame size (10 MB) to prevent memory exhaustion
    pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;
}

/// Names of the host objects registered with the bridge
pub mod objects {
    pub const APP: &str = "app";
    pub const SETTINGS: &str = "settings";
}

/// Method names understood by the host objects
pub mod methods {
    pub const SHOW_MESSAGE: &str = "ShowMessage";
    pub const TOGGLE_OVERLAY: &str = "ToggleOverlay";
    pub const GET_VERSION: &str = "GetVersion";
    pub const QUIT_APPLICATION: &str = "QuitApplication";
    pub const UPDATE_TRANSPARENCY: &str = "UpdateTransparency";
    pub const PAUSE_HOTKEY: &str = "PauseHotkey";
    pub const RESUME_HOTKEY: &str = "ResumeHotkey";
    pub const GET_SETTINGS: &str = "GetSettings";
    pub const UPDATE_SETTINGS: &str = "UpdateSettings";
}

/// Sentinel version strings returned when the real version cannot be read
pub mod version {
    /// No host bridge present
    pub const DEV: &str = "0.0.0-dev";

    /// Host call failed or returned no version
    pub const ERROR: &str = "0.0.0-error";
}

/// Transparency bounds and preview pacing
pub mod transparency {
    pub const MIN: f64 = 0.1;
    pub const MAX: f64 = 1.0;

    /// Delay before a slider burst is forwarded to the host preview
    pub const PREVIEW_DEBOUNCE_MS: u64 = 300;
}

/// Envelope diagnostics
pub mod messages {
    /// Used when the host reports failure without a message
    pub const UNKNOWN_ERROR: &str = "Unknown error occurred";

    /// Used when a value-returning call succeeds without data
    pub const NO_DATA: &str = "No data returned from connector";

    /// Save refused because a load or save is still running
    pub const SETTINGS_BUSY: &str = "Settings are busy loading or saving";
}
