use serde::{Deserialize, Serialize};
use std::fmt;

/// Состояние клавиши
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyState {
    Pressed,
    Released,
    Repeat,
}

impl KeyState {
    /// Значение evdev-события: 0 - отпускание, 1 - нажатие, 2 - автоповтор
    pub fn from_evdev_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyState::Released),
            1 => Some(KeyState::Pressed),
            2 => Some(KeyState::Repeat),
            _ => None,
        }
    }

    pub fn is_down(&self) -> bool {
        matches!(self, KeyState::Pressed | KeyState::Repeat)
    }
}

/// Отдельный модификатор
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKey {
    Ctrl,
    Alt,
    Shift,
    Super,
}

impl ModifierKey {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "ctrl" | "control" => Some(ModifierKey::Ctrl),
            "alt" | "mod1" => Some(ModifierKey::Alt),
            "shift" => Some(ModifierKey::Shift),
            "super" | "mod4" => Some(ModifierKey::Super),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModifierKey::Ctrl => "ctrl",
            ModifierKey::Alt => "alt",
            ModifierKey::Shift => "shift",
            ModifierKey::Super => "super",
        }
    }
}

impl fmt::Display for ModifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Маска удерживаемых модификаторов
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub super_key: bool,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: ModifierKey) -> Self {
        self.set(key, true);
        self
    }

    pub fn set(&mut self, key: ModifierKey, held: bool) {
        match key {
            ModifierKey::Ctrl => self.ctrl = held,
            ModifierKey::Alt => self.alt = held,
            ModifierKey::Shift => self.shift = held,
            ModifierKey::Super => self.super_key = held,
        }
    }

    pub fn contains(&self, key: ModifierKey) -> bool {
        match key {
            ModifierKey::Ctrl => self.ctrl,
            ModifierKey::Alt => self.alt,
            ModifierKey::Shift => self.shift,
            ModifierKey::Super => self.super_key,
        }
    }

    pub fn to_vec(&self) -> Vec<&'static str> {
        let mut result = Vec::new();
        if self.ctrl { result.push("ctrl"); }
        if self.alt { result.push("alt"); }
        if self.shift { result.push("shift"); }
        if self.super_key { result.push("super"); }
        result
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = self.to_vec();
        if modifiers.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", modifiers.join("+"))
        }
    }
}
