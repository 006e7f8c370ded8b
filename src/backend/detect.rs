use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    X11,
    Wayland,
    Unknown,
}

pub fn detect_session() -> SessionKind {
    let session_type = env::var("XDG_SESSION_TYPE").ok();
    let display = env::var("DISPLAY").ok();
    let wayland_display = env::var("WAYLAND_DISPLAY").ok();

    classify(
        session_type.as_deref(),
        display.as_deref(),
        wayland_display.as_deref(),
    )
}

fn classify(
    session_type: Option<&str>,
    display: Option<&str>,
    wayland_display: Option<&str>,
) -> SessionKind {
    match session_type.map(str::to_lowercase).as_deref() {
        Some("x11") => return SessionKind::X11,
        Some("wayland") => return SessionKind::Wayland,
        _ => {}
    }

    // XWayland тоже выставляет DISPLAY, поэтому Wayland проверяем первым
    if wayland_display.is_some_and(|d| !d.is_empty()) {
        return SessionKind::Wayland;
    }

    if display.is_some_and(|d| !d.is_empty()) {
        return SessionKind::X11;
    }

    SessionKind::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_type_wins() {
        assert_eq!(classify(Some("x11"), None, Some("wayland-0")), SessionKind::X11);
        assert_eq!(classify(Some("Wayland"), Some(":0"), None), SessionKind::Wayland);
    }

    #[test]
    fn xwayland_display_is_not_x11() {
        assert_eq!(classify(None, Some(":0"), Some("wayland-0")), SessionKind::Wayland);
        assert_eq!(classify(Some("tty"), Some(":0"), None), SessionKind::X11);
        assert_eq!(classify(None, Some(""), None), SessionKind::Unknown);
    }
}
