//! Overlay window boundary

use tracing::info;

use crate::settings::clamp_transparency;

/// The always-on-top window the host shows and hides
pub trait OverlayWindow: Send {
    fn is_visible(&self) -> bool;
    fn set_visible(&mut self, visible: bool);
    fn transparency(&self) -> f64;
    fn set_transparency(&mut self, transparency: f64);

    /// Show a message to the user
    fn show_message(&mut self, message: &str);
}

/// Overlay that records its state and logs; used when no window system is wired in
#[derive(Debug)]
pub struct HeadlessOverlay {
    visible: bool,
    transparency: f64,
}

impl HeadlessOverlay {
    pub fn new(transparency: f64) -> Self {
        Self {
            visible: false,
            transparency: clamp_transparency(transparency),
        }
    }
}

impl OverlayWindow for HeadlessOverlay {
    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            info!(visible, "Overlay visibility changed");
        }
        self.visible = visible;
    }

    fn transparency(&self) -> f64 {
        self.transparency
    }

    fn set_transparency(&mut self, transparency: f64) {
        self.transparency = clamp_transparency(transparency);
        info!(opacity = self.transparency, "Overlay transparency updated");
    }

    fn show_message(&mut self, message: &str) {
        info!(message = %message, "Message from guest");
    }
}
