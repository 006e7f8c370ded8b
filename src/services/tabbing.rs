//! Activity tabbing: hold the switch modifier and press the switch key to cycle
//! through running activities.
//!
//! The handler is driven only from the shell loop. Every switch restarts a
//! single one-shot commit timer, so a burst of key repeats raises only the
//! last selection once the burst settles. Releasing the modifier commits
//! immediately.

use std::sync::Arc;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::backend::WindowBackend;
use crate::events::{InputDevice, InputSource, ModifierKey, Modifiers};
use crate::model::{Activity, ShellModel, ZoomLevel};
use crate::services::frame::Frame;
use crate::services::timer::{TimerId, TimerService};

pub const DEFAULT_RAISE_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Next,
    Previous,
}

pub struct TabbingHandler {
    frame: Arc<dyn Frame>,
    model: Arc<dyn ShellModel>,
    backend: Arc<dyn WindowBackend>,
    timer: Box<dyn TimerService>,
    modifier: ModifierKey,
    raise_delay: Duration,
    tabbing: bool,
    // Существует только пока tabbing == true
    commit_timer: Option<TimerId>,
    keyboard: Option<InputDevice>,
    mouse: Option<InputDevice>,
}

impl TabbingHandler {
    pub fn new(
        frame: Arc<dyn Frame>,
        model: Arc<dyn ShellModel>,
        backend: Arc<dyn WindowBackend>,
        timer: Box<dyn TimerService>,
        modifier: ModifierKey,
    ) -> Self {
        let mut keyboard = None;
        let mut mouse = None;
        for device in backend.master_devices() {
            match device.source {
                InputSource::Keyboard => keyboard = Some(device),
                InputSource::Mouse => mouse = Some(device),
            }
        }

        if keyboard.is_none() || mouse.is_none() {
            warn!(
                "Бэкенд {} не сообщил о клавиатуре или мыши, проверка модификатора отключена",
                backend.name()
            );
        }
        info!(
            "Инициализация TabbingHandler (модификатор: {}, клавиатура: {:?}, мышь: {:?})",
            modifier,
            keyboard.as_ref().map(|d| d.name.as_str()),
            mouse.as_ref().map(|d| d.name.as_str())
        );

        Self {
            frame,
            model,
            backend,
            timer,
            modifier,
            raise_delay: DEFAULT_RAISE_DELAY,
            tabbing: false,
            commit_timer: None,
            keyboard,
            mouse,
        }
    }

    pub fn with_raise_delay(mut self, raise_delay: Duration) -> Self {
        self.raise_delay = raise_delay;
        self
    }

    pub fn is_tabbing(&self) -> bool {
        self.tabbing
    }

    pub fn next_activity(&mut self, event_time: u32) {
        self.switch(Direction::Next, event_time);
    }

    pub fn previous_activity(&mut self, event_time: u32) {
        self.switch(Direction::Previous, event_time);
    }

    /// Модификатор отпущен: завершить сессию и сразу применить выбор
    pub fn stop(&mut self, event_time: u32) {
        if !self.tabbing {
            debug!("stop() вне сессии переключения - пропускаем");
            return;
        }

        info!("Завершение переключения активностей");
        self.tabbing = false;
        self.frame.hide();
        self.cancel_timeout();
        self.activate_current(event_time);
        self.model.set_tabbing_activity(None);
    }

    /// Сработал отложенный commit. Таймеры, которые уже не являются текущими,
    /// игнорируются.
    pub fn on_commit_due(&mut self, timer: TimerId, event_time: u32) {
        if self.commit_timer != Some(timer) {
            debug!("Устаревший {} проигнорирован", timer);
            return;
        }
        self.commit_timer = None;
        self.activate_current(event_time);
    }

    fn switch(&mut self, direction: Direction, event_time: u32) {
        let first_switch = !self.tabbing;
        if first_switch {
            self.start_tabbing();
        }

        if !self.tabbing {
            self.activate_next_activity(event_time);
            return;
        }

        let zoom_activity = self.model.zoom_level() == ZoomLevel::Activity;
        let activity = if first_switch && !zoom_activity {
            // Первое нажатие подтверждает текущую активность
            self.model.active_activity()
        } else {
            let current = self.model.tabbing_activity();
            match direction {
                Direction::Next => self.model.next_activity(current.as_ref()),
                Direction::Previous => self.model.previous_activity(current.as_ref()),
            }
        };

        debug!(
            "Выбрана активность {:?} ({:?}, первое переключение: {})",
            activity.as_ref().map(|a| a.id.as_str()),
            direction,
            first_switch
        );
        self.model.set_tabbing_activity(activity.as_ref());
        self.start_timeout(event_time);
    }

    fn start_tabbing(&mut self) {
        debug!(
            "Начало переключения активностей (клавиатура: {:?})",
            self.keyboard.as_ref().map(|d| d.name.as_str())
        );

        let window = self.frame.window();
        self.tabbing = window.is_some();

        if let Some(window) = window {
            if let Err(e) = self.backend.grab_focus(window) {
                warn!("Не удалось взять фокус на рамку {}: {}", window, e);
            }
        }

        // Модификатор мог быть отпущен между событием клавиши и захватом фокуса
        let mask = match (window, self.mouse.as_ref()) {
            (Some(window), Some(mouse)) => self
                .backend
                .device_modifier_mask(window, mouse)
                .unwrap_or_else(|e| {
                    warn!("Не удалось прочитать маску модификаторов: {}", e);
                    Modifiers::new()
                }),
            _ => Modifiers::new(),
        };

        if !self.tabbing || !mask.contains(self.modifier) {
            debug!("Модификатор {} не удерживается (маска: {}), переключение отменено", self.modifier, mask);
            self.tabbing = false;
            // Рамка могла быть отображена ради фокуса
            if let Some(window) = window {
                if let Err(e) = self.backend.hide_window(window) {
                    warn!("Не удалось скрыть рамку {}: {}", window, e);
                }
            }
        } else {
            self.frame.show();
        }
    }

    fn start_timeout(&mut self, event_time: u32) {
        self.cancel_timeout();
        self.commit_timer = Some(self.timer.schedule_once(self.raise_delay, event_time));
    }

    fn cancel_timeout(&mut self) {
        if let Some(timer) = self.commit_timer.take() {
            self.timer.cancel(timer);
        }
    }

    fn activate_current(&self, event_time: u32) {
        if let Some(activity) = self.model.tabbing_activity() {
            self.activate(&activity, event_time);
        }
    }

    /// Быстрое нажатие без сессии: сразу активировать следующую активность
    fn activate_next_activity(&self, event_time: u32) {
        if let Some(activity) = self.model.next_activity(None) {
            self.activate(&activity, event_time);
        }
    }

    fn activate(&self, activity: &Activity, event_time: u32) {
        let Some(window) = activity.window else {
            debug!("У активности {} нет окна, активация пропущена", activity.id);
            return;
        };

        if !self.backend.is_realized(window) {
            debug!("Окно {} активности {} уже не существует", window, activity.id);
            return;
        }

        info!("Активация {}", activity);
        if let Err(e) = self.backend.activate(window, event_time) {
            warn!("Не удалось активировать окно {}: {}", window, e);
        }
    }
}

impl Drop for TabbingHandler {
    fn drop(&mut self) {
        self.cancel_timeout();
    }
}
