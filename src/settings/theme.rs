use std::sync::Mutex;
use tracing::info;

use super::Theme;

/// Applies a theme to the rendering surface
pub trait ThemeApplier: Send + Sync {
    fn apply(&self, theme: Theme);
}

/// Tracks the document-level `data-theme` attribute
#[derive(Debug, Default)]
pub struct DocumentTheme {
    current: Mutex<Option<Theme>>,
}

impl DocumentTheme {
    /// Last applied theme, if any
    pub fn current(&self) -> Option<Theme> {
        *self.current.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Current `data-theme` attribute value
    pub fn attribute(&self) -> Option<&'static str> {
        self.current().map(Theme::attribute)
    }
}

impl ThemeApplier for DocumentTheme {
    fn apply(&self, theme: Theme) {
        *self.current.lock().unwrap_or_else(|p| p.into_inner()) = Some(theme);
        info!(theme = %theme, attribute = theme.attribute(), "Theme applied");
    }
}
