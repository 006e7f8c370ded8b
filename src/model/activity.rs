use serde::{Deserialize, Serialize};
use std::fmt;

use crate::events::WindowId;

/// Идентификатор запущенной активности
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityId(String);

impl ActivityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Запущенная активность. Окна может ещё не быть, пока оно не отображено.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub window: Option<WindowId>,
}

impl Activity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ActivityId::new(id),
            window: None,
        }
    }

    pub fn with_window(mut self, window: WindowId) -> Self {
        self.window = Some(window);
        self
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.window {
            Some(window) => write!(f, "{} [{}]", self.id, window),
            None => write!(f, "{} [без окна]", self.id),
        }
    }
}

/// Уровень масштаба оболочки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoomLevel {
    /// Активное окно не принадлежит ни одной активности
    Home,
    /// Одна активность на весь экран
    Activity,
}

impl Default for ZoomLevel {
    fn default() -> Self {
        ZoomLevel::Home
    }
}
