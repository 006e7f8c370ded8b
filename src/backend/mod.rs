//! Window backend: responsibility and boundaries
//!
//! This module and its submodules only talk to the window system: device
//! state, focus, activation and realized-ness of window handles. They MUST NOT
//! contain tabbing logic; every switching decision is made by the tabbing
//! coordinator. The concrete backend is selected once, at startup.

mod detect;
mod dry_run;
mod dummy;
mod x11;
mod r#trait;

pub use self::dry_run::DryRunWindowBackend;
pub use self::dummy::DummyWindowBackend;
pub use self::r#trait::{create_window_backend, DeviceList, WindowBackend};
