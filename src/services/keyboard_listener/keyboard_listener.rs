use crate::config::Config;
use crate::error::{Result, ShellError};
use crate::events::{event_time_ms, KeyState, ShellEvent};
use crate::services::keycode_map::KeycodeMap;
use crate::utils::DeviceFinder;
use evdev::{Device, EventType};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

use super::modifier_state::SwitchChord;
use super::r#trait::KeyboardListenerTrait;

pub struct RealKeyboardListener {
    device: Device,
    chord: SwitchChord,
    events: UnboundedSender<ShellEvent>,
}

impl RealKeyboardListener {
    pub fn new(config: Arc<Config>, events: UnboundedSender<ShellEvent>) -> Result<Self> {
        info!("Инициализация RealKeyboardListener");

        let switch_key = KeycodeMap::get_keycode(&config.input.switch_key)
            .map_err(ShellError::Internal)?;
        info!(
            "Переключение: {}+{} (код {}), обратно с {}",
            config.input.modifier,
            KeycodeMap::get_key_name(switch_key).unwrap_or("?"),
            switch_key,
            config.input.reverse_modifier
        );
        let chord = SwitchChord::new(config.switch_modifier()?, config.reverse_modifier()?, switch_key);

        let device_path = DeviceFinder::find_keyboard_device(&config.input.device_path)?;
        let device = Device::open(&device_path).map_err(|e| {
            ShellError::DeviceNotFound(format!(
                "Не удалось открыть устройство {:?}: {}",
                device_path, e
            ))
        })?;

        // Устройство не захватывается: оболочка только наблюдает за клавишами
        info!("Устройство: {}", device.name().unwrap_or("Unknown"));
        info!("Физический путь: {:?}", device.physical_path());

        Ok(Self {
            device,
            chord,
            events,
        })
    }

    /// Блокирующий цикл чтения, выполняется в отдельном потоке
    fn read_loop(mut self) -> Result<()> {
        info!("RealKeyboardListener запущен, начинаем чтение событий");

        loop {
            let events_vec = match self.device.fetch_events() {
                Ok(events) => events.collect::<Vec<_>>(),
                Err(e) => {
                    error!("Ошибка чтения событий: {}", e);
                    std::thread::sleep(Duration::from_millis(100));
                    continue;
                }
            };

            for event in events_vec {
                if event.event_type() != EventType::KEY {
                    continue;
                }

                let Some(key_state) = KeyState::from_evdev_value(event.value()) else {
                    debug!("Неизвестное значение события: {}", event.value());
                    continue;
                };

                let event_time = event_time_ms(event.timestamp());
                if let Some(shell_event) = self.chord.feed(event.code(), key_state, event_time) {
                    debug!("Событие переключения: {:?}", shell_event);
                    if self.events.send(shell_event).is_err() {
                        info!("Цикл оболочки остановлен, KeyboardListener завершает работу");
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl KeyboardListenerTrait for RealKeyboardListener {
    async fn run(self: Box<Self>) -> Result<()> {
        let listener = *self;
        tokio::task::spawn_blocking(move || listener.read_loop())
            .await
            .map_err(|e| ShellError::Internal(format!("Поток чтения клавиатуры упал: {}", e)))?
    }
}
