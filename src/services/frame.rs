use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::WindowBackend;
use crate::events::WindowId;

/// The visual switcher surface shown while tabbing.
pub trait Frame: Send + Sync {
    fn show(&self);
    fn hide(&self);
    /// Underlying window, if the surface has one
    fn window(&self) -> Option<WindowId>;
    fn is_visible(&self) -> bool;
}

/// Switcher frame backed by the window the backend provides for it
pub struct SwitcherFrame {
    backend: Arc<dyn WindowBackend>,
    window: Option<WindowId>,
    visible: AtomicBool,
}

impl SwitcherFrame {
    pub fn new(backend: Arc<dyn WindowBackend>) -> Self {
        let window = backend.frame_window();
        debug!("Окно рамки переключателя: {:?}", window);
        Self {
            backend,
            window,
            visible: AtomicBool::new(false),
        }
    }
}

impl Frame for SwitcherFrame {
    fn show(&self) {
        if let Some(window) = self.window {
            if let Err(e) = self.backend.show_window(window) {
                warn!("Не удалось показать рамку {}: {}", window, e);
            }
        }
        self.visible.store(true, Ordering::Relaxed);
    }

    fn hide(&self) {
        if !self.visible.swap(false, Ordering::Relaxed) {
            return;
        }
        if let Some(window) = self.window {
            if let Err(e) = self.backend.hide_window(window) {
                warn!("Не удалось скрыть рамку {}: {}", window, e);
            }
        }
    }

    fn window(&self) -> Option<WindowId> {
        self.window
    }

    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DryRunWindowBackend, DummyWindowBackend};
    use crate::events::ModifierKey;

    #[test]
    fn frame_tracks_visibility() {
        let frame = SwitcherFrame::new(Arc::new(DryRunWindowBackend::new(ModifierKey::Alt)));
        assert!(frame.window().is_some());
        assert!(!frame.is_visible());

        frame.show();
        assert!(frame.is_visible());
        frame.hide();
        assert!(!frame.is_visible());
    }

    #[test]
    fn dummy_backend_has_no_frame_window() {
        let frame = SwitcherFrame::new(Arc::new(DummyWindowBackend::new()));
        assert_eq!(frame.window(), None);
    }
}
