use crate::error::Result;
use crate::shell_error;
use std::fs;
use tracing::{info, warn};

/// Проверить доступ к устройствам ввода
pub fn check_permissions() -> Result<()> {
    info!("Проверка прав доступа...");

    check_input_devices_access()?;
    check_not_root();

    info!("Проверка прав доступа завершена успешно");
    Ok(())
}

fn check_input_devices_access() -> Result<()> {
    let input_dir = "/dev/input";

    if !std::path::Path::new(input_dir).exists() {
        return Err(shell_error!(permission, "Директория {} не существует", input_dir));
    }

    match fs::read_dir(input_dir) {
        Ok(_) => {
            info!("Доступ к {} подтвержден", input_dir);
            Ok(())
        }
        Err(e) => Err(shell_error!(
            permission,
            "Нет доступа к {}: {}. Добавьте пользователя в группу 'input'",
            input_dir,
            e
        )),
    }
}

fn check_not_root() {
    match std::env::var("USER") {
        Ok(user) if user == "root" => {
            warn!("⚠️  Демон запущен от имени root!");
            warn!("   Достаточно членства в группе 'input':");
            warn!("   sudo usermod -a -G input $USER");
        }
        Ok(user) => {
            info!("Демон запущен от имени пользователя: {}", user);
        }
        Err(_) => {
            warn!("Не удалось определить пользователя");
        }
    }
}
