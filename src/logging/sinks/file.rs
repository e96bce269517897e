use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, registry::LookupSpan, Layer};

use super::console::BoxedLayer;
use crate::logging::config::{FileSinkConfig, LogFormat};

/// Файловый layer с ежедневной ротацией и non-blocking записью.
///
/// Возвращённый guard нужно держать до конца работы, иначе хвост буфера
/// будет потерян.
pub fn layer_with_config<S>(
    sink: &FileSinkConfig,
    format: LogFormat,
) -> (BoxedLayer<S>, WorkerGuard)
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let appender = rolling::daily(&sink.dir, &sink.prefix);
    let (writer, guard) = non_blocking(appender);

    let base = fmt::layer().with_ansi(false).with_writer(writer);
    let layer = match format {
        LogFormat::Json => base.json().boxed(),
        LogFormat::Pretty | LogFormat::Compact => base.boxed(),
    };

    (layer, guard)
}
