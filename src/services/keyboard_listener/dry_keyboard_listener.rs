use crate::config::Config;
use crate::error::Result;
use crate::events::ShellEvent;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval, sleep, Duration, Instant};
use tracing::info;

use super::r#trait::KeyboardListenerTrait;

pub struct DryRunKeyboardListener {
    config: Arc<Config>,
    events: UnboundedSender<ShellEvent>,
}

impl DryRunKeyboardListener {
    pub fn new(config: Arc<Config>, events: UnboundedSender<ShellEvent>) -> Result<Self> {
        info!("Инициализация DryRunKeyboardListener");
        Ok(Self { config, events })
    }

    async fn run_impl(self) -> Result<()> {
        info!(
            "Dry-run режим - эмулируем {}+{} каждые 10 секунд",
            self.config.input.modifier, self.config.input.switch_key
        );

        let started = Instant::now();
        let now_ms = || started.elapsed().as_millis() as u32;
        let mut interval = interval(Duration::from_secs(10));

        loop {
            interval.tick().await;

            // Серия из трёх нажатий, затем отпускание модификатора
            for _ in 0..3 {
                if self.events.send(ShellEvent::NextActivity { event_time: now_ms() }).is_err() {
                    return Ok(());
                }
                sleep(Duration::from_millis(120)).await;
            }
            sleep(Duration::from_millis(500)).await;
            if self.events.send(ShellEvent::ModifierReleased { event_time: now_ms() }).is_err() {
                return Ok(());
            }
        }
    }
}

#[async_trait::async_trait]
impl KeyboardListenerTrait for DryRunKeyboardListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
