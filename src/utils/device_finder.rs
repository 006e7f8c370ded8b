use crate::error::{Result, ShellError};
use evdev::KeyCode;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct DeviceFinder;

impl DeviceFinder {
    /// Найти клавиатуру, на которой будут отслеживаться переключения
    pub fn find_keyboard_device(device_path: &str) -> Result<PathBuf> {
        if device_path != "auto" {
            let path = PathBuf::from(device_path);
            return if path.exists() {
                info!("Используется указанное устройство: {:?}", path);
                Ok(path)
            } else {
                ShellError::device_not_found(format!("Указанное устройство не найдено: {:?}", path))
            };
        }

        info!("Начинаем автопоиск клавиатурного устройства...");

        if let Ok(device) = Self::find_by_id() {
            info!("Найдено устройство по ID: {:?}", device);
            return Ok(device);
        }

        if let Ok(device) = Self::find_by_event_devices() {
            info!("Найдено устройство среди event устройств: {:?}", device);
            return Ok(device);
        }

        ShellError::device_not_found(
            "Не удалось найти подходящее клавиатурное устройство. \
             Убедитесь, что пользователь добавлен в группу 'input'",
        )
    }

    fn find_by_id() -> Result<PathBuf> {
        let by_id_dir = Path::new("/dev/input/by-id");
        let entries = fs::read_dir(by_id_dir).map_err(|e| {
            ShellError::Permission(format!("Нет доступа к {:?}: {}", by_id_dir, e))
        })?;

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| name.ends_with("-event-kbd"))
            })
            .collect();
        candidates.sort();

        candidates
            .into_iter()
            .find(|path| Self::is_switch_capable(path))
            .map_or_else(
                || ShellError::device_not_found("Клавиатурное устройство не найдено в by-id"),
                Ok,
            )
    }

    fn find_by_event_devices() -> Result<PathBuf> {
        let input_dir = Path::new("/dev/input");
        let entries = fs::read_dir(input_dir)
            .map_err(|e| ShellError::Permission(format!("Нет доступа к /dev/input: {}", e)))?;

        let mut event_devices: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| name.starts_with("event"))
            })
            .collect();
        event_devices.sort();

        for device_path in event_devices {
            debug!("Проверяем устройство: {:?}", device_path);
            if Self::is_switch_capable(&device_path) {
                return Ok(device_path);
            }
        }

        ShellError::device_not_found("Не найдено доступное клавиатурное устройство среди event устройств")
    }

    /// Устройство умеет Tab и Alt - значит это полноценная клавиатура
    fn is_switch_capable(device_path: &Path) -> bool {
        match evdev::Device::open(device_path) {
            Ok(device) => {
                let capable = device.supported_keys().is_some_and(|keys| {
                    keys.contains(KeyCode::KEY_TAB) && keys.contains(KeyCode::KEY_LEFTALT)
                });
                if !capable {
                    debug!(
                        "Устройство {} не похоже на клавиатуру",
                        device.name().unwrap_or("Unknown")
                    );
                }
                capable
            }
            Err(e) => {
                warn!("Не удалось открыть устройство {:?}: {}", device_path, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_keyboard_device_with_specific_path() {
        let result = DeviceFinder::find_keyboard_device("/non/existent/path");
        assert!(matches!(result, Err(ShellError::DeviceNotFound(_))));
    }
}
