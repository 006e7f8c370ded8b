pub mod frame;
pub mod keyboard_listener;
pub mod keycode_map;
pub mod registry_service;
pub mod shell;
pub mod tabbing;
pub mod timer;
pub mod window_tracker;

pub use frame::SwitcherFrame;
pub use keyboard_listener::create_keyboard_listener;
pub use registry_service::serve_registry;
pub use shell::ShellService;
pub use tabbing::TabbingHandler;
pub use timer::TokioTimer;
pub use window_tracker::ActiveWindowTracker;
