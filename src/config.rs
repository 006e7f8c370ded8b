use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::events::ModifierKey;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub input: InputConfig,
    pub tabbing: TabbingConfig,
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// compact | full
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    pub device_path: String,
    /// Модификатор, который нужно удерживать во время переключения
    pub modifier: String,
    /// Клавиша переключения (вместе с модификатором)
    pub switch_key: String,
    /// Модификатор, разворачивающий направление переключения
    pub reverse_modifier: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TabbingConfig {
    /// Задержка перед активацией выбранной активности
    pub raise_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// auto | x11 | dummy
    pub mode: String,
    pub polling_interval_ms: u64,
    pub dbus_registry: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
            },
            input: InputConfig {
                device_path: "auto".to_string(),
                modifier: "alt".to_string(),
                switch_key: "tab".to_string(),
                reverse_modifier: "shift".to_string(),
            },
            tabbing: TabbingConfig {
                raise_delay_ms: 250,
            },
            backend: BackendConfig {
                mode: "auto".to_string(),
                polling_interval_ms: 500,
                dbus_registry: true,
            },
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        // Отсутствующий файл не ошибка: значения по умолчанию + переменные окружения
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("SUGAR_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "full" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        let modifier = self.switch_modifier()?;
        let reverse = self.reverse_modifier()?;
        if modifier == reverse {
            anyhow::bail!(
                "modifier и reverse_modifier не должны совпадать: {}",
                self.input.modifier
            );
        }

        if crate::services::keycode_map::KeycodeMap::get_keycode(&self.input.switch_key).is_err() {
            anyhow::bail!("Неизвестная клавиша переключения: {}", self.input.switch_key);
        }

        if self.tabbing.raise_delay_ms == 0 {
            anyhow::bail!("raise_delay_ms должно быть больше 0");
        }

        match self.backend.mode.as_str() {
            "auto" | "x11" | "dummy" => {}
            _ => anyhow::bail!("Неверный режим бэкенда окон: {}", self.backend.mode),
        }

        if self.backend.polling_interval_ms < 100 {
            anyhow::bail!("polling_interval_ms должно быть минимум 100");
        }

        Ok(())
    }

    pub fn switch_modifier(&self) -> Result<ModifierKey> {
        ModifierKey::parse(&self.input.modifier)
            .with_context(|| format!("Неверный модификатор: {}", self.input.modifier))
    }

    pub fn reverse_modifier(&self) -> Result<ModifierKey> {
        ModifierKey::parse(&self.input.reverse_modifier)
            .with_context(|| format!("Неверный модификатор: {}", self.input.reverse_modifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tabbing.raise_delay_ms, 250);
        assert_eq!(config.switch_modifier().unwrap(), ModifierKey::Alt);
    }

    #[test]
    fn test_rejects_same_modifiers() {
        let mut config = Config::default();
        config.input.reverse_modifier = "alt".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_values() {
        let mut config = Config::default();
        config.backend.mode = "wayland".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.input.switch_key = "not-a-key".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tabbing.raise_delay_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_merges_file_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "sugar.toml",
                r#"
                [tabbing]
                raise_delay_ms = 400

                [backend]
                mode = "dummy"
                "#,
            )?;
            jail.set_env("SUGAR_INPUT__MODIFIER", "super");

            let config = Config::load("sugar.toml").expect("config should load");
            assert_eq!(config.tabbing.raise_delay_ms, 400);
            assert_eq!(config.backend.mode, "dummy");
            assert_eq!(config.switch_modifier().unwrap(), ModifierKey::Super);
            // Не указанное в файле берётся из значений по умолчанию
            assert_eq!(config.input.switch_key, "tab");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("sugar.toml", "[backend]\nmode = \"wayland\"\n")?;
            assert!(Config::load("sugar.toml").is_err());
            Ok(())
        });
    }
}
