use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::{error, info, warn};
mod backend;
mod config;
mod error;
mod events;
mod model;
mod services;
mod utils;

use backend::create_window_backend;
use config::Config;
use events::{ShellEvent, WindowId};
use model::{ActivityRegistry, HomeModel};
use services::{
    create_keyboard_listener, serve_registry, ActiveWindowTracker, ShellService, SwitcherFrame,
    TabbingHandler, TokioTimer,
};

#[derive(Parser, Debug)]
#[command(name = "sugar-tabbing")]
#[command(about = "Переключение активностей Sugar по удержанию модификатора и Tab")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "sugar-tabbing.toml")]
    config: String,

    /// Режим сухого запуска (эмуляция окон и клавиатуры)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (по умолчанию из конфигурации)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let config = Arc::new(Config::load(&args.config)?);

    // Инициализация системы логирования
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Запуск Sugar tabbing v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - окна и клавиатура эмулируются");
    } else {
        utils::permissions::check_permissions()?;
    }

    // Бэкенд выбирается один раз при старте
    let backend = create_window_backend(&config, args.dry_run)?;
    info!("Бэкенд окон: {}", backend.name());

    let registry = Arc::new(ActivityRegistry::new());
    if args.dry_run {
        seed_dry_run_activities(&registry)?;
    }

    let model = Arc::new(HomeModel::new());
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let handler = TabbingHandler::new(
        Arc::new(SwitcherFrame::new(backend.clone())),
        model.clone(),
        backend.clone(),
        Box::new(TokioTimer::new(events_tx.clone())),
        config.switch_modifier()?,
    )
    .with_raise_delay(Duration::from_millis(config.tabbing.raise_delay_ms));

    let shell = ShellService::new(handler, model, registry.clone(), backend.clone(), events_rx);
    let keyboard_listener = create_keyboard_listener(config.clone(), events_tx.clone(), args.dry_run)?;
    let window_tracker = ActiveWindowTracker::new(
        backend.clone(),
        events_tx.clone(),
        config.backend.polling_interval_ms,
    );
    // Через этот отправитель циклу оболочки сообщается о завершении
    let shutdown_tx = events_tx;

    // Соединение держим до завершения, иначе сервис пропадёт с шины
    let _dbus_connection = if config.backend.dbus_registry && !args.dry_run {
        match serve_registry(registry.clone()).await {
            Ok(connection) => Some(connection),
            Err(e) => {
                warn!("Реестр активностей на D-Bus недоступен: {}", e);
                None
            }
        }
    } else {
        None
    };

    info!("Все компоненты инициализированы");

    let shell_handle = tokio::spawn(async move {
        if let Err(e) = shell.run().await {
            error!("Ошибка в цикле оболочки: {}", e);
        }
    });
    let keyboard_handle = tokio::spawn(async move {
        if let Err(e) = keyboard_listener.run().await {
            error!("Ошибка в KeyboardListener: {}", e);
        }
    });
    let tracker_handle = tokio::spawn(async move {
        if let Err(e) = window_tracker.run().await {
            error!("Ошибка в ActiveWindowTracker: {}", e);
        }
    });

    info!("Все сервисы запущены");

    match signal::ctrl_c().await {
        Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
        Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
    }

    info!("Завершение работы...");

    // Поток чтения клавиатуры блокирующий: abort лишь отсоединяет его
    keyboard_handle.abort();
    tracker_handle.abort();

    // Цикл оболочки завершается сам, чтобы закрыть незавершённое переключение
    if shutdown_tx.send(ShellEvent::Shutdown).is_err() {
        warn!("Цикл оболочки уже остановлен");
    }

    let shutdown_timeout = Duration::from_secs(5);
    let shell_abort = shell_handle.abort_handle();
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        let _ = tracker_handle.await;
        let _ = shell_handle.await;
    })
    .await;

    if shutdown_result.is_err() {
        shell_abort.abort();
    }

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    info!("Sugar tabbing завершил работу");
    Ok(())
}

fn seed_dry_run_activities(registry: &ActivityRegistry) -> error::Result<()> {
    let fake_activities = [
        "org.laptop.Terminal-dry_run",
        "org.laptop.AbiWordActivity-dry_run",
        "org.laptop.WebActivity-dry_run",
    ];

    for (i, activity_id) in fake_activities.iter().enumerate() {
        registry.register(WindowId(0x0100_0001 + i as u32), activity_id)?;
    }
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let (compact, full) = if format == "full" {
        (None, Some(fmt::layer()))
    } else {
        (Some(fmt::layer().compact()), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(compact)
        .with(full)
        .init();

    Ok(())
}
