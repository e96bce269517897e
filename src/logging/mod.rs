pub mod config;
pub mod filters;
pub mod handle;
pub mod sinks;

pub use config::{FileSinkConfig, LogFormat, LoggingConfig};
pub use handle::LoggingHandle;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Ошибки инициализации логирования.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log level '{0}', expected one of trace|debug|info|warn|error")]
    InvalidLevel(String),
    #[error("Invalid log format '{0}', expected one of compact|pretty|json")]
    InvalidFormat(String),
    #[error("Log file prefix must not be empty")]
    InvalidFilePrefix,
    #[error("Failed to prepare log directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Устанавливает глобальный subscriber по конфигурации.
///
/// `config` используется как есть: переменные окружения `CREDKEEP_*` уже
/// учтены в [`crate::config::Settings`]. Повторный вызов в том же процессе
/// возвращает [`LoggingError::AlreadyInitialized`].
pub fn init_logging(config: LoggingConfig) -> Result<LoggingHandle, LoggingError> {
    config.validate()?;
    config.ensure_log_dir()?;

    let env_filter = filters::build_filter_from_config(&config);
    let mut layers = vec![sinks::console::layer_with_config(&config)];

    let file_guard = match &config.file {
        Some(sink) => {
            let (layer, guard) = sinks::file::layer_with_config(sink, config.format);
            layers.push(layer);
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()?;

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        level = %config.level,
        format = ?config.format,
        file_sink = file_guard.is_some(),
        "Logging initialized"
    );

    Ok(LoggingHandle::new(file_guard))
}
