//! Модель оболочки: запущенные активности, масштаб и указатель переключения.
//!
//! Координатор переключения видит модель только через трейт [`ShellModel`],
//! реестр окон активностей живёт отдельно и синхронизируется циклом оболочки.

pub mod activity;
pub mod home;
pub mod registry;

pub use activity::{Activity, ActivityId, ZoomLevel};
pub use home::{HomeModel, ShellModel};
pub use registry::{ActivityRegistry, RegistryEvent};
