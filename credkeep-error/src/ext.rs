use std::{any::Any, error::Error};

use crate::StatusCode;

/// Расширение для ошибок credkeep (object-safe).
///
/// Даёт единый набор вспомогательных методов поверх `std::error::Error`:
/// - статус-код операции,
/// - безопасное сообщение для внешнего потребителя,
/// - детализированное сообщение для логов,
/// - теги для структурированного логирования.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Статус операции.
    fn status_code(&self) -> StatusCode;

    /// Возвращает ошибку как [`Any`](std::any::Any) для downcast.
    fn as_any(&self) -> &dyn Any;

    /// Безопасное сообщение для внешнего потребителя.
    ///
    /// Для серверных ошибок детали скрываются и возвращается
    /// `"Internal error"`.
    fn client_message(&self) -> String {
        if self.status_code().is_server_error() {
            "Internal error".to_string()
        } else {
            self.to_string()
        }
    }

    /// Детализированное сообщение для логов.
    fn log_message(&self) -> String {
        format!("{self:?}")
    }

    /// Пары ключ–значение для полей `tracing`-событий.
    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        vec![
            ("error_type", self.type_name()),
            ("status_code", self.status_code().to_string()),
        ]
    }

    /// Короткое имя типа ошибки (без пути модулей).
    fn type_name(&self) -> String {
        std::any::type_name::<Self>()
            .split("::")
            .last()
            .unwrap_or("Unknown")
            .to_string()
    }
}
