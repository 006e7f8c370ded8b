use crate::error::Result;
use crate::events::{event_time_ms, InputDevice, InputSource, Modifiers, WindowId};
use crate::shell_error;
use smallvec::smallvec;
use std::time::SystemTime;
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ChangeWindowAttributesAux, ClientMessageData, ClientMessageEvent,
    ConnectionExt as _, CreateWindowAux, EventMask, InputFocus, KeyButMask, PropMode, Window,
    WindowClass, CLIENT_MESSAGE_EVENT,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use super::r#trait::{DeviceList, WindowBackend};

// Идентификаторы master-устройств ядра XInput2
const CORE_POINTER_ID: u16 = 2;
const CORE_KEYBOARD_ID: u16 = 3;

// Источник запроса _NET_ACTIVE_WINDOW: 2 = пейджер/оболочка
const ACTIVE_WINDOW_SOURCE_PAGER: u32 = 2;

/// Перевод времени событий клавиатуры во время X-сервера.
///
/// Время сервера отсчитывается от его запуска, поэтому при подключении
/// фиксируется пара отметок, снятых в один момент. Обе шкалы в миллисекундах
/// и переполняются по модулю 2^32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ServerClock {
    server_anchor: u32,
    local_anchor: u32,
}

impl ServerClock {
    fn to_server_time(self, local: u32) -> u32 {
        if local == 0 {
            return x11rb::CURRENT_TIME;
        }
        self.server_anchor
            .wrapping_add(local.wrapping_sub(self.local_anchor))
    }
}

pub struct X11WindowBackend {
    conn: RustConnection,
    root: Window,
    frame: Window,
    net_active_window: Atom,
    net_client_list_stacking: Atom,
    clock: ServerClock,
}

impl X11WindowBackend {
    pub fn connect() -> Result<Self> {
        info!("Подключение к X-серверу");

        let (conn, screen_num) = RustConnection::connect(None)?;
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or_else(|| shell_error!(internal, "Экран X11 #{} не найден", screen_num))?;

        let net_active_window = conn.intern_atom(false, b"_NET_ACTIVE_WINDOW")?.reply()?.atom;
        let net_client_list_stacking = conn
            .intern_atom(false, b"_NET_CLIENT_LIST_STACKING")?
            .reply()?
            .atom;

        // Невидимое InputOnly окно рамки переключателя: на него берётся фокус
        // и относительно него читается маска модификаторов
        let frame = conn.generate_id()?;
        conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            frame,
            root,
            0,
            0,
            1,
            1,
            0,
            WindowClass::INPUT_ONLY,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new().override_redirect(1),
        )?;
        conn.flush()?;

        let timestamp_atom = conn.intern_atom(false, b"_SUGAR_TIMESTAMP")?.reply()?.atom;
        let clock = Self::sync_server_clock(&conn, frame, timestamp_atom)?;

        info!(
            "X11 бэкенд готов (root: 0x{:x}, frame: 0x{:x}, время сервера: {})",
            root, frame, clock.server_anchor
        );

        Ok(Self {
            conn,
            root,
            frame,
            net_active_window,
            net_client_list_stacking,
            clock,
        })
    }

    /// Время сервера узнаётся из PropertyNotify на пустое изменение свойства
    fn sync_server_clock(conn: &RustConnection, window: Window, atom: Atom) -> Result<ServerClock> {
        conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE),
        )?;
        conn.change_property8(PropMode::APPEND, window, atom, AtomEnum::STRING, &[])?;
        conn.flush()?;
        let local_anchor = event_time_ms(SystemTime::now());

        let server_anchor = loop {
            if let Event::PropertyNotify(event) = conn.wait_for_event()? {
                if event.window == window && event.atom == atom {
                    break event.time;
                }
            }
        };

        conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().event_mask(EventMask::NO_EVENT),
        )?;
        conn.flush()?;

        Ok(ServerClock {
            server_anchor,
            local_anchor,
        })
    }

    fn modifiers_from_mask(mask: KeyButMask) -> Modifiers {
        let bits = u16::from(mask);
        let has = |flag: KeyButMask| bits & u16::from(flag) != 0;
        Modifiers {
            ctrl: has(KeyButMask::CONTROL),
            alt: has(KeyButMask::MOD1),
            shift: has(KeyButMask::SHIFT),
            super_key: has(KeyButMask::MOD4),
        }
    }

    fn root_property_windows(&self, property: Atom, max_len: u32) -> Result<Vec<WindowId>> {
        let reply = self
            .conn
            .get_property(false, self.root, property, AtomEnum::WINDOW, 0, max_len)?
            .reply()?;

        Ok(reply
            .value32()
            .map(|values| values.filter(|w| *w != 0).map(WindowId).collect())
            .unwrap_or_default())
    }
}

impl WindowBackend for X11WindowBackend {
    fn name(&self) -> &'static str {
        "x11"
    }

    fn master_devices(&self) -> DeviceList {
        smallvec![
            InputDevice::new(CORE_KEYBOARD_ID, "Virtual core keyboard", InputSource::Keyboard),
            InputDevice::new(CORE_POINTER_ID, "Virtual core pointer", InputSource::Mouse),
        ]
    }

    fn device_modifier_mask(&self, window: WindowId, device: &InputDevice) -> Result<Modifiers> {
        let reply = self.conn.query_pointer(window.value())?.reply()?;
        let modifiers = Self::modifiers_from_mask(reply.mask);
        debug!("Маска модификаторов {} относительно {}: {}", device, window, modifiers);
        Ok(modifiers)
    }

    fn grab_focus(&self, window: WindowId) -> Result<()> {
        // Фокус можно отдать только отображённому окну, иначе BadMatch
        self.conn.map_window(window.value())?;
        self.conn
            .set_input_focus(InputFocus::PARENT, window.value(), x11rb::CURRENT_TIME)?
            .check()?;
        Ok(())
    }

    fn activate(&self, window: WindowId, event_time: u32) -> Result<()> {
        let server_time = self.clock.to_server_time(event_time);
        let data = ClientMessageData::from([
            ACTIVE_WINDOW_SOURCE_PAGER,
            server_time,
            0u32,
            0u32,
            0u32,
        ]);
        let event = ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            sequence: 0,
            window: window.value(),
            type_: self.net_active_window,
            data,
        };
        self.conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        )?;
        self.conn.flush()?;
        debug!(
            "Запрошена активация окна {} (время {}, время сервера {})",
            window, event_time, server_time
        );
        Ok(())
    }

    fn is_realized(&self, window: WindowId) -> bool {
        self.conn
            .get_window_attributes(window.value())
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .is_some()
    }

    fn active_window(&self) -> Option<WindowId> {
        match self.root_property_windows(self.net_active_window, 1) {
            Ok(windows) => windows.into_iter().next(),
            Err(e) => {
                debug!("Не удалось прочитать _NET_ACTIVE_WINDOW: {}", e);
                None
            }
        }
    }

    fn windows_stacked(&self) -> Vec<WindowId> {
        self.root_property_windows(self.net_client_list_stacking, u32::MAX)
            .unwrap_or_else(|e| {
                debug!("Не удалось прочитать _NET_CLIENT_LIST_STACKING: {}", e);
                Vec::new()
            })
    }

    fn frame_window(&self) -> Option<WindowId> {
        Some(WindowId(self.frame))
    }

    fn show_window(&self, window: WindowId) -> Result<()> {
        self.conn.map_window(window.value())?;
        self.conn.flush()?;
        Ok(())
    }

    fn hide_window(&self, window: WindowId) -> Result<()> {
        self.conn.unmap_window(window.value())?;
        self.conn.flush()?;
        Ok(())
    }
}

impl Drop for X11WindowBackend {
    fn drop(&mut self) {
        info!("X11 бэкенд завершает работу");
        if let Err(e) = self.conn.destroy_window(self.frame) {
            warn!("Не удалось удалить окно рамки: {}", e);
        }
        let _ = self.conn.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_translation() {
        let mask = KeyButMask::MOD1 | KeyButMask::SHIFT;
        let modifiers = X11WindowBackend::modifiers_from_mask(mask);
        assert!(modifiers.alt);
        assert!(modifiers.shift);
        assert!(!modifiers.ctrl);
        assert!(!modifiers.super_key);

        assert_eq!(X11WindowBackend::modifiers_from_mask(KeyButMask::BUTTON1), Modifiers::new());
    }

    #[test]
    fn keyboard_time_is_shifted_to_server_time() {
        let clock = ServerClock {
            server_anchor: 5_000,
            local_anchor: 1_700_000_000,
        };
        assert_eq!(clock.to_server_time(1_700_000_250), 5_250);
        // Событие, снятое незадолго до синхронизации
        assert_eq!(clock.to_server_time(1_699_999_900), 4_900);
        assert_eq!(clock.to_server_time(0), x11rb::CURRENT_TIME);
    }

    #[test]
    fn server_time_wraps_with_keyboard_time() {
        let local_wraps = ServerClock {
            server_anchor: 100,
            local_anchor: u32::MAX - 10,
        };
        assert_eq!(local_wraps.to_server_time(20), 131);

        let server_wraps = ServerClock {
            server_anchor: u32::MAX - 10,
            local_anchor: 1_000,
        };
        assert_eq!(server_wraps.to_server_time(1_030), 19);
    }
}
