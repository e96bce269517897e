use std::fmt;

use crate::{ErrorExt, StatusCode};

/// Ошибка операций над учётными записями.
///
/// Каждый вариант несёт логин или имя поля, к которому относится ошибка.
/// Пароль и его хеш в ошибку не попадают никогда.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// Обязательное поле пустое после обрезки пробелов
    Validation { field: &'static str },
    /// Логин уже зарегистрирован
    DuplicateLogin { login: String },
    /// Учётная запись не найдена
    NotFound { login: String },
    /// Хеш пароля не совпал
    InvalidCredentials { login: String },
    /// Учётная запись деактивирована
    InactiveAccount { login: String },
    /// Гостевая сессия истекла
    SessionExpired { login: String },
    /// Операция требует учётную запись другого вида
    KindMismatch {
        login: String,
        expected: &'static str,
    },
    /// Ошибка хранилища (SQLite, файловая система)
    Storage { reason: String },
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl AccountError {
    pub fn validation(field: &'static str) -> Self {
        Self::Validation { field }
    }

    pub fn storage(reason: impl fmt::Display) -> Self {
        Self::Storage {
            reason: reason.to_string(),
        }
    }

    /// Логин, к которому относится ошибка, если он есть.
    pub fn login(&self) -> Option<&str> {
        match self {
            Self::DuplicateLogin { login }
            | Self::NotFound { login }
            | Self::InvalidCredentials { login }
            | Self::InactiveAccount { login }
            | Self::SessionExpired { login }
            | Self::KindMismatch { login, .. } => Some(login),
            Self::Validation { .. } | Self::Storage { .. } => None,
        }
    }

    /// Короткое имя вида ошибки.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::DuplicateLogin { .. } => "DuplicateLoginError",
            Self::NotFound { .. } => "NotFoundError",
            Self::InvalidCredentials { .. } => "InvalidCredentialsError",
            Self::InactiveAccount { .. } => "InactiveAccountError",
            Self::SessionExpired { .. } => "SessionExpiredError",
            Self::KindMismatch { .. } => "KindMismatchError",
            Self::Storage { .. } => "StorageError",
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для AccountError
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for AccountError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Validation { field } => {
                write!(f, "Validation failed: {field} must not be empty")
            }
            Self::DuplicateLogin { login } => write!(f, "Login already exists: {login}"),
            Self::NotFound { login } => write!(f, "Account not found: {login}"),
            Self::InvalidCredentials { login } => {
                write!(f, "Invalid credentials for account: {login}")
            }
            Self::InactiveAccount { login } => write!(f, "Account is inactive: {login}"),
            Self::SessionExpired { login } => write!(f, "Guest session expired: {login}"),
            Self::KindMismatch { login, expected } => {
                write!(f, "Account {login} is not of kind {expected}")
            }
            Self::Storage { reason } => write!(f, "Storage error: {reason}"),
        }
    }
}

impl std::error::Error for AccountError {}

impl ErrorExt for AccountError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::InvalidArgs,
            Self::DuplicateLogin { .. } => StatusCode::UserExists,
            Self::NotFound { .. } => StatusCode::UserNotFound,
            Self::InvalidCredentials { .. } => StatusCode::InvalidCredentials,
            Self::InactiveAccount { .. } => StatusCode::AccountInactive,
            Self::SessionExpired { .. } => StatusCode::SessionExpired,
            Self::KindMismatch { .. } => StatusCode::WrongAccountKind,
            Self::Storage { .. } => StatusCode::StorageUnavailable,
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            // Не раскрываем, существует ли логин
            Self::NotFound { .. } | Self::InvalidCredentials { .. } => {
                "Invalid login or password".to_string()
            }
            Self::InactiveAccount { .. } => "Account is inactive".to_string(),
            Self::SessionExpired { .. } => "Session has expired".to_string(),
            Self::Storage { .. } => "Internal error".to_string(),
            _ => self.to_string(),
        }
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", self.kind().to_string()),
            ("status_code", self.status_code().to_string()),
        ];

        match self {
            Self::Validation { field } => tags.push(("field", field.to_string())),
            Self::KindMismatch { login, expected } => {
                tags.push(("login", login.clone()));
                tags.push(("expected", expected.to_string()));
            }
            _ => {
                if let Some(login) = self.login() {
                    tags.push(("login", login.to_string()));
                }
            }
        }

        tags
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_login_and_field() {
        let err = AccountError::DuplicateLogin {
            login: "alice".into(),
        };
        assert_eq!(err.to_string(), "Login already exists: alice");

        let err = AccountError::validation("display_name");
        assert_eq!(
            err.to_string(),
            "Validation failed: display_name must not be empty"
        );
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AccountError::validation("login"), StatusCode::InvalidArgs),
            (
                AccountError::NotFound { login: "x".into() },
                StatusCode::UserNotFound,
            ),
            (
                AccountError::InvalidCredentials { login: "x".into() },
                StatusCode::InvalidCredentials,
            ),
            (
                AccountError::InactiveAccount { login: "x".into() },
                StatusCode::AccountInactive,
            ),
            (
                AccountError::SessionExpired { login: "x".into() },
                StatusCode::SessionExpired,
            ),
            (
                AccountError::storage("disk I/O error"),
                StatusCode::StorageUnavailable,
            ),
        ];

        for (err, code) in cases {
            assert_eq!(err.status_code(), code, "{err}");
        }
    }

    /// Тест проверяет, что client_message не раскрывает существование логина.
    #[test]
    fn test_client_message_hides_enumeration() {
        let missing = AccountError::NotFound {
            login: "admin".into(),
        };
        let wrong = AccountError::InvalidCredentials {
            login: "admin".into(),
        };
        assert_eq!(missing.client_message(), wrong.client_message());
        assert!(!missing.client_message().contains("admin"));
    }

    #[test]
    fn test_storage_reason_hidden_from_client() {
        let err = AccountError::storage("unable to open database file");
        assert_eq!(err.client_message(), "Internal error");
        assert!(err.to_string().contains("unable to open database file"));
    }

    #[test]
    fn test_metrics_tags_carry_login() {
        let err = AccountError::InactiveAccount {
            login: "bob".into(),
        };
        let tags = err.metrics_tags();
        assert!(tags.iter().any(|(k, v)| *k == "login" && v == "bob"));
        assert!(tags
            .iter()
            .any(|(k, v)| *k == "error_type" && v == "InactiveAccountError"));
    }

    #[test]
    fn test_login_accessor() {
        assert_eq!(
            AccountError::SessionExpired {
                login: "guest".into()
            }
            .login(),
            Some("guest")
        );
        assert_eq!(AccountError::validation("password").login(), None);
    }

    #[test]
    fn test_as_any_downcast() {
        let err = AccountError::NotFound {
            login: "noone".into(),
        };
        assert!(err.as_any().downcast_ref::<AccountError>().is_some());
    }
}
