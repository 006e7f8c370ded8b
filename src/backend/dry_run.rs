use crate::error::Result;
use crate::events::{InputDevice, InputSource, ModifierKey, Modifiers, WindowId};
use parking_lot::RwLock;
use smallvec::smallvec;
use tracing::info;

use super::r#trait::{DeviceList, WindowBackend};

const FRAME_WINDOW: WindowId = WindowId(1);

/// Emulated backend for `--dry-run`: every window is realized, the switch
/// modifier always reads as held and activation only reorders the emulated
/// stacking list.
pub struct DryRunWindowBackend {
    held: Modifiers,
    stack: RwLock<Vec<WindowId>>,
}

impl DryRunWindowBackend {
    pub fn new(modifier: ModifierKey) -> Self {
        info!("Dry-run режим - бэкенд окон работает в режиме эмуляции");
        Self {
            held: Modifiers::new().with(modifier),
            stack: RwLock::new(Vec::new()),
        }
    }
}

impl WindowBackend for DryRunWindowBackend {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    fn master_devices(&self) -> DeviceList {
        smallvec![
            InputDevice::new(3, "Dry-run keyboard", InputSource::Keyboard),
            InputDevice::new(2, "Dry-run pointer", InputSource::Mouse),
        ]
    }

    fn device_modifier_mask(&self, _window: WindowId, _device: &InputDevice) -> Result<Modifiers> {
        Ok(self.held)
    }

    fn grab_focus(&self, window: WindowId) -> Result<()> {
        info!("[DRY RUN] Фокус на окно {}", window);
        Ok(())
    }

    fn activate(&self, window: WindowId, event_time: u32) -> Result<()> {
        info!("[DRY RUN] Активация окна {} (время {})", window, event_time);
        let mut stack = self.stack.write();
        stack.retain(|w| *w != window);
        stack.push(window);
        Ok(())
    }

    fn is_realized(&self, window: WindowId) -> bool {
        window.value() != 0
    }

    fn active_window(&self) -> Option<WindowId> {
        self.stack.read().last().copied()
    }

    fn windows_stacked(&self) -> Vec<WindowId> {
        self.stack.read().clone()
    }

    fn frame_window(&self) -> Option<WindowId> {
        Some(FRAME_WINDOW)
    }

    fn show_window(&self, window: WindowId) -> Result<()> {
        info!("[DRY RUN] Показ окна {}", window);
        Ok(())
    }

    fn hide_window(&self, window: WindowId) -> Result<()> {
        info!("[DRY RUN] Скрытие окна {}", window);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_moves_window_to_top() {
        let backend = DryRunWindowBackend::new(ModifierKey::Alt);
        backend.activate(WindowId(10), 0).unwrap();
        backend.activate(WindowId(11), 0).unwrap();
        backend.activate(WindowId(10), 0).unwrap();

        assert_eq!(backend.windows_stacked(), vec![WindowId(11), WindowId(10)]);
        assert_eq!(backend.active_window(), Some(WindowId(10)));
    }

    #[test]
    fn modifier_always_held() {
        let backend = DryRunWindowBackend::new(ModifierKey::Super);
        let mouse = backend.master_devices()[1].clone();
        let mask = backend.device_modifier_mask(FRAME_WINDOW, &mouse).unwrap();
        assert!(mask.contains(ModifierKey::Super));
        assert!(!mask.contains(ModifierKey::Alt));
    }
}
