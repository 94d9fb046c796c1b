//! Global hotkey description and registration state
//!
//! The OS-level registration itself lives outside this crate; the host only
//! needs to know which combination is active and whether it is paused while
//! the user is recording a new one.

use anyhow::{anyhow, Result};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Modifier bit set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const ALT: Modifiers = Modifiers(0x0001);
    pub const CONTROL: Modifiers = Modifiers(0x0002);
    pub const SHIFT: Modifiers = Modifiers(0x0004);
    pub const WIN: Modifiers = Modifiers(0x0008);

    const NAMED: [(&'static str, Modifiers); 4] = [
        ("Control", Modifiers::CONTROL),
        ("Alt", Modifiers::ALT),
        ("Shift", Modifiers::SHIFT),
        ("Win", Modifiers::WIN),
    ];

    /// Recognize modifier names anywhere in the text ("ControlShift", "Control Alt", ...)
    pub fn from_text(text: &str) -> Self {
        Self::NAMED
            .iter()
            .filter(|(name, _)| text.contains(name))
            .fold(Modifiers::default(), |acc, (_, bit)| Modifiers(acc.0 | bit.0))
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMED
            .iter()
            .filter(|(_, bit)| self.contains(*bit))
            .map(|(name, _)| *name)
            .collect();
        f.write_str(&names.join("+"))
    }
}

/// Keys that can be bound as the overlay hotkey
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyKey {
    Space,
    Letter(char),
    Digit(u8),
    Function(u8),
    Escape,
    Enter,
    Tab,
    Delete,
}

impl FromStr for HotkeyKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = match s {
            "Space" => HotkeyKey::Space,
            "Escape" => HotkeyKey::Escape,
            "Enter" => HotkeyKey::Enter,
            "Tab" => HotkeyKey::Tab,
            "Delete" => HotkeyKey::Delete,
            single if single.len() == 1 => {
                let c = single.chars().next().unwrap_or_default();
                match c {
                    'A'..='Z' => HotkeyKey::Letter(c),
                    '0'..='9' => HotkeyKey::Digit(c as u8 - b'0'),
                    _ => return Err(anyhow!("Unsupported hotkey key '{s}'")),
                }
            }
            function if function.starts_with('F') => match function[1..].parse::<u8>() {
                Ok(n @ 1..=12) => HotkeyKey::Function(n),
                _ => return Err(anyhow!("Unsupported hotkey key '{s}'")),
            },
            _ => return Err(anyhow!("Unsupported hotkey key '{s}'")),
        };
        Ok(key)
    }
}

impl fmt::Display for HotkeyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotkeyKey::Space => f.write_str("Space"),
            HotkeyKey::Letter(c) => write!(f, "{c}"),
            HotkeyKey::Digit(d) => write!(f, "{d}"),
            HotkeyKey::Function(n) => write!(f, "F{n}"),
            HotkeyKey::Escape => f.write_str("Escape"),
            HotkeyKey::Enter => f.write_str("Enter"),
            HotkeyKey::Tab => f.write_str("Tab"),
            HotkeyKey::Delete => f.write_str("Delete"),
        }
    }
}

/// A modifier + key combination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hotkey {
    pub modifiers: Modifiers,
    pub key: HotkeyKey,
}

impl Hotkey {
    /// Build from the persisted textual fields; unknown keys fall back to Space
    pub fn from_settings(modifiers: &str, key: &str) -> Self {
        let key = key.parse().unwrap_or_else(|err| {
            warn!(key = %key, error = %err, "Falling back to Space for hotkey");
            HotkeyKey::Space
        });
        Self {
            modifiers: Modifiers::from_text(modifiers),
            key,
        }
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers == Modifiers::default() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key)
        }
    }
}

/// Boundary to the OS hotkey facility
pub trait HotkeyRegistrar: Send {
    fn register(&mut self, hotkey: Hotkey) -> Result<()>;
    fn unregister(&mut self);
    fn registered(&self) -> Option<Hotkey>;
}

/// Registrar that only tracks state; used when no OS facility is wired in
#[derive(Debug, Default)]
pub struct HeadlessHotkeys {
    active: Option<Hotkey>,
}

impl HotkeyRegistrar for HeadlessHotkeys {
    fn register(&mut self, hotkey: Hotkey) -> Result<()> {
        if let Some(previous) = self.active.replace(hotkey) {
            debug!(previous = %previous, "Replacing registered hotkey");
        }
        info!(hotkey = %hotkey, bits = hotkey.modifiers.bits(), "Hotkey registered");
        Ok(())
    }

    fn unregister(&mut self) {
        if let Some(hotkey) = self.active.take() {
            info!(hotkey = %hotkey, "Hotkey unregistered");
        }
    }

    fn registered(&self) -> Option<Hotkey> {
        self.active
    }
}
