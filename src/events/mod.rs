pub mod keyboard;
pub mod window;

pub use keyboard::{KeyState, ModifierKey, Modifiers};
pub use window::{InputDevice, InputSource, WindowId};

use crate::services::timer::TimerId;
use std::time::{SystemTime, UNIX_EPOCH};

/// Время события клавиатуры: миллисекунды часов реального времени, усечённые
/// до u32. С временем X-сервера не совпадает, бэкенд X11 переводит его сам.
pub fn event_time_ms(timestamp: SystemTime) -> u32 {
    timestamp
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u32)
        .unwrap_or(0)
}

/// События, которые обрабатывает цикл оболочки.
///
/// Все обращения к координатору переключения проходят через этот канал,
/// поэтому состояние сессии меняется только в одной задаче.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    /// Модификатор + клавиша переключения (нажатие или автоповтор)
    NextActivity { event_time: u32 },
    /// То же с обратным модификатором
    PreviousActivity { event_time: u32 },
    /// Модификатор переключения отпущен
    ModifierReleased { event_time: u32 },
    /// Сработал отложенный commit
    CommitDue { timer: TimerId, event_time: u32 },
    /// Бэкенд сообщил о смене активного окна
    ActiveWindowChanged { window: Option<WindowId> },
    /// Завершение работы демона
    Shutdown,
}

impl ShellEvent {
    pub fn event_time(&self) -> Option<u32> {
        match self {
            ShellEvent::NextActivity { event_time }
            | ShellEvent::PreviousActivity { event_time }
            | ShellEvent::ModifierReleased { event_time }
            | ShellEvent::CommitDue { event_time, .. } => Some(*event_time),
            ShellEvent::ActiveWindowChanged { .. } | ShellEvent::Shutdown => None,
        }
    }
}
