use crate::error::Result;
use crate::events::{InputDevice, Modifiers, WindowId};
use tracing::info;

use super::r#trait::{DeviceList, WindowBackend};

/// Backend for sessions without a supported window system: reports nothing
/// and does nothing.
pub struct DummyWindowBackend;

impl DummyWindowBackend {
    pub fn new() -> Self {
        info!("Используется no-op бэкенд окон");
        Self
    }
}

impl WindowBackend for DummyWindowBackend {
    fn name(&self) -> &'static str {
        "dummy"
    }

    fn master_devices(&self) -> DeviceList {
        DeviceList::new()
    }

    fn device_modifier_mask(&self, _window: WindowId, _device: &InputDevice) -> Result<Modifiers> {
        Ok(Modifiers::new())
    }

    fn grab_focus(&self, _window: WindowId) -> Result<()> {
        Ok(())
    }

    fn activate(&self, _window: WindowId, _event_time: u32) -> Result<()> {
        Ok(())
    }

    fn is_realized(&self, _window: WindowId) -> bool {
        false
    }

    fn active_window(&self) -> Option<WindowId> {
        None
    }

    fn windows_stacked(&self) -> Vec<WindowId> {
        Vec::new()
    }

    fn frame_window(&self) -> Option<WindowId> {
        None
    }

    fn show_window(&self, _window: WindowId) -> Result<()> {
        Ok(())
    }

    fn hide_window(&self, _window: WindowId) -> Result<()> {
        Ok(())
    }
}
