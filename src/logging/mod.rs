//! Инициализация `tracing` для встраивающего приложения.
//!
//! Библиотека сама глобальный subscriber не ставит: это делает приложение
//! вызовом [`init_logging`], либо устанавливает собственный.

pub mod config;
mod filters;
pub mod formats;
pub mod handle;

use std::fs;

pub use config::{LogFormat, LoggingConfig};
pub use handle::LoggingHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Инициализация логирования с конфигурацией.
///
/// Ставит глобальный subscriber: фильтр уровней, консольный вывод и,
/// если задан файл, неблокирующую запись в файл. Повторная установка
/// возвращает ошибку.
pub fn init_logging(
    mut config: LoggingConfig
) -> Result<LoggingHandle, Box<dyn std::error::Error>> {
    config.apply_env_overrides();
    config.validate()?;

    let env_filter = filters::build_filter_from_config(&config);
    let mut layers = Vec::new();

    if config.console_enabled {
        layers.push(formats::build_layer(
            config.format,
            std::io::stderr,
            config.with_ansi,
            config.with_target,
        ));
    }

    let file_guard = match &config.file {
        Some(path) => {
            let dir = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => std::path::PathBuf::from("."),
            };
            fs::create_dir_all(&dir)?;
            let name = path
                .file_name()
                .ok_or_else(|| format!("log file path '{}' has no file name", path.display()))?;
            let appender = tracing_appender::rolling::never(&dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        format = ?config.format,
        file = ?config.file,
        "Logging system initialized"
    );

    Ok(LoggingHandle::new(file_guard, config.file))
}
