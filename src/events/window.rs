use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор окна бэкенда (XID для X11)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u32);

impl WindowId {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Источник master-устройства ввода
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputSource {
    Keyboard,
    Mouse,
}

/// Master-устройство, о котором сообщает бэкенд
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputDevice {
    pub id: u16,
    pub name: String,
    pub source: InputSource,
}

impl InputDevice {
    pub fn new(id: u16, name: impl Into<String>, source: InputSource) -> Self {
        Self {
            id,
            name: name.into(),
            source,
        }
    }
}

impl fmt::Display for InputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" (#{}, {:?})", self.name, self.id, self.source)
    }
}
