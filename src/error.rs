use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка D-Bus: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Не удалось подключиться к X-серверу: {0}")]
    X11Connect(#[from] x11rb::errors::ConnectError),

    #[error("Ошибка соединения с X-сервером: {0}")]
    X11Connection(#[from] x11rb::errors::ConnectionError),

    #[error("Ошибка ответа X-сервера: {0}")]
    X11Reply(#[from] x11rb::errors::ReplyError),

    #[error("Ошибка ответа X-сервера: {0}")]
    X11ReplyOrId(#[from] x11rb::errors::ReplyOrIdError),

    #[error("Устройство не найдено: {0}")]
    DeviceNotFound(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Неверный идентификатор активности: {0}")]
    InvalidActivity(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl ShellError {
    pub fn device_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(ShellError::DeviceNotFound(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! shell_error {
    (device_not_found, $($arg:tt)*) => {
        $crate::error::ShellError::DeviceNotFound(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::ShellError::Permission(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::ShellError::Internal(format!($($arg)*))
    };
}
