use crate::config::Config;
use crate::error::Result;
use crate::events::{InputDevice, Modifiers, WindowId};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{info, warn};

use super::detect::{detect_session, SessionKind};
use super::dry_run::DryRunWindowBackend;
use super::dummy::DummyWindowBackend;
use super::x11::X11WindowBackend;

/// Master devices reported by a backend; a keyboard and a pointer in practice.
pub type DeviceList = SmallVec<[InputDevice; 2]>;

/// Trait for window system backends.
///
/// All calls are cheap enough to be made from the shell loop. Window handles
/// are owned by the window system and may become stale at any moment, so
/// callers check [`WindowBackend::is_realized`] before acting on them.
pub trait WindowBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Master input devices (keyboard and mouse)
    fn master_devices(&self) -> DeviceList;

    /// Modifier mask of `device` as seen relative to `window`
    fn device_modifier_mask(&self, window: WindowId, device: &InputDevice) -> Result<Modifiers>;

    /// May map `window` first; `hide_window` undoes that
    fn grab_focus(&self, window: WindowId) -> Result<()>;

    /// Activate (raise and focus) a window at the given event time
    fn activate(&self, window: WindowId, event_time: u32) -> Result<()>;

    /// Whether the handle still refers to a native window
    fn is_realized(&self, window: WindowId) -> bool;

    fn active_window(&self) -> Option<WindowId>;

    /// Client windows, bottom to top
    fn windows_stacked(&self) -> Vec<WindowId>;

    /// Window backing the switcher frame, if the backend can provide one
    fn frame_window(&self) -> Option<WindowId>;

    fn show_window(&self, window: WindowId) -> Result<()>;

    fn hide_window(&self, window: WindowId) -> Result<()>;
}

/// Factory function to create the window backend once at startup
pub fn create_window_backend(config: &Config, dry_run: bool) -> Result<Arc<dyn WindowBackend>> {
    if dry_run {
        return Ok(Arc::new(DryRunWindowBackend::new(config.switch_modifier()?)));
    }

    match config.backend.mode.as_str() {
        "x11" => Ok(Arc::new(X11WindowBackend::connect()?)),
        "dummy" => Ok(Arc::new(DummyWindowBackend::new())),
        _ => {
            let session = detect_session();
            info!("Обнаружен тип сессии: {:?}", session);

            if session != SessionKind::X11 {
                return Ok(Arc::new(DummyWindowBackend::new()));
            }

            match X11WindowBackend::connect() {
                Ok(backend) => Ok(Arc::new(backend)),
                Err(e) => {
                    warn!("X11 бэкенд недоступен: {}, используем no-op бэкенд", e);
                    Ok(Arc::new(DummyWindowBackend::new()))
                }
            }
        }
    }
}
