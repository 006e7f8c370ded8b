use crate::backend::WindowBackend;
use crate::error::Result;
use crate::events::{ShellEvent, WindowId};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

/// Polls the backend for the active window and reports changes to the shell loop
pub struct ActiveWindowTracker {
    backend: Arc<dyn WindowBackend>,
    events: UnboundedSender<ShellEvent>,
    polling_interval: Duration,
    current: Option<WindowId>,
}

impl ActiveWindowTracker {
    pub fn new(
        backend: Arc<dyn WindowBackend>,
        events: UnboundedSender<ShellEvent>,
        polling_interval_ms: u64,
    ) -> Self {
        Self {
            backend,
            events,
            polling_interval: Duration::from_millis(polling_interval_ms),
            current: None,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        info!(
            "Отслеживание активного окна ({} бэкенд, интервал {}мс)",
            self.backend.name(),
            self.polling_interval.as_millis()
        );

        let mut interval = interval(self.polling_interval);
        loop {
            interval.tick().await;

            if let Some(event) = self.poll_once() {
                if self.events.send(event).is_err() {
                    info!("Цикл оболочки остановлен, отслеживание окон завершено");
                    return Ok(());
                }
            }
        }
    }

    fn poll_once(&mut self) -> Option<ShellEvent> {
        let window = self.backend.active_window();
        if window == self.current {
            return None;
        }

        debug!("Смена активного окна: {:?} -> {:?}", self.current, window);
        self.current = window;
        Some(ShellEvent::ActiveWindowChanged { window })
    }
}
