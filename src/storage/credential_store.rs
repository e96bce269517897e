use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use credkeep_error::{AccountError, AccountResult};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::connector::{ConnectionFactory, SqliteFile};
use crate::auth::{
    account::{require_field, require_password},
    password::PasswordHash,
};

/// Схема таблицы учётных записей. Повторное выполнение безопасно.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS accounts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        login TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        display_name TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
    );
";

/// Форматы `created_at`: с миллисекундами (значение по умолчанию схемы) и
/// без них (`CURRENT_TIMESTAMP`).
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Запись учётной записи без хеша пароля.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRecord {
    pub login: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// Персистентное хранилище учётных записей поверх SQLite.
#[derive(Debug)]
pub struct CredentialStore<F = SqliteFile>
where
    F: ConnectionFactory,
{
    factory: F,
}

////////////////////////////////////////////////////////////////////////////////
// Внутренние методы и функции
////////////////////////////////////////////////////////////////////////////////

impl CredentialStore<SqliteFile> {
    /// Открывает (или создаёт) хранилище по пути к файлу БД.
    pub fn open(path: impl AsRef<Path>) -> AccountResult<Self> {
        let file = SqliteFile::new(path);
        let existed = file.is_initialized();
        let store = Self::with_factory(file)?;

        if existed {
            info!(path = %store.factory.describe(), "Connected to existing account database");
        } else {
            info!(path = %store.factory.describe(), "New account database created");
        }
        Ok(store)
    }
}

impl<F> CredentialStore<F>
where
    F: ConnectionFactory,
{
    /// Создаёт хранилище с произвольной фабрикой соединений и применяет схему.
    pub fn with_factory(factory: F) -> AccountResult<Self> {
        let store = Self { factory };
        let conn = store.connection()?;
        conn.execute_batch(SCHEMA).map_err(storage_error)?;
        Ok(store)
    }

    /// Создаёт учётную запись.
    pub fn create_account(
        &self,
        login: &str,
        password: &str,
        display_name: &str,
    ) -> AccountResult<()> {
        let login = require_field(login, "login")?;
        let password = require_password(password)?;
        let display_name = require_field(display_name, "display_name")?;
        let hash = PasswordHash::compute(password);

        let conn = self.connection()?;
        let result = conn.execute(
            "INSERT INTO accounts (login, password_hash, display_name) VALUES (?1, ?2, ?3)",
            params![login, hash.as_str(), display_name],
        );

        match result {
            Ok(_) => {
                info!(login = %login, "Account created");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                warn!(login = %login, "Account creation rejected: login already exists");
                Err(AccountError::DuplicateLogin {
                    login: login.to_string(),
                })
            }
            Err(e) => Err(storage_error(e)),
        }
    }

    /// Проверяет логин и пароль.
    pub fn authenticate(
        &self,
        login: &str,
        password: &str,
    ) -> AccountResult<()> {
        self.authenticate_account(login, password).map(|_| ())
    }

    /// Проверяет логин и пароль и возвращает запись учётной записи.
    pub fn authenticate_account(
        &self,
        login: &str,
        password: &str,
    ) -> AccountResult<AccountRecord> {
        let login = require_field(login, "login")?;
        let password = require_password(password)?;

        let conn = self.connection()?;
        let row: Option<(String, String, String)> = conn
            .query_row(
                "SELECT password_hash, display_name, created_at FROM accounts WHERE login = ?1",
                params![login],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(storage_error)?;
        drop(conn);

        let Some((stored_hash, display_name, created_at)) = row else {
            warn!(login = %login, "Authentication failed: account not found");
            return Err(AccountError::NotFound {
                login: login.to_string(),
            });
        };

        if !PasswordHash::from_stored(stored_hash).matches(password) {
            warn!(login = %login, "Authentication failed: invalid password");
            return Err(AccountError::InvalidCredentials {
                login: login.to_string(),
            });
        }

        info!(login = %login, display_name = %display_name, "Authentication successful");
        Ok(AccountRecord {
            login: login.to_string(),
            display_name,
            created_at: parse_timestamp(&created_at)?,
        })
    }

    /// Заменяет хеш пароля существующей учётной записи.
    pub fn update_password(
        &self,
        login: &str,
        new_password: &str,
    ) -> AccountResult<()> {
        let login = require_field(login, "login")?;
        let new_password = require_password(new_password)?;
        let hash = PasswordHash::compute(new_password);

        let conn = self.connection()?;
        let updated = conn
            .execute(
                "UPDATE accounts SET password_hash = ?1 WHERE login = ?2",
                params![hash.as_str(), login],
            )
            .map_err(storage_error)?;

        if updated == 0 {
            warn!(login = %login, "Password update rejected: account not found");
            return Err(AccountError::NotFound {
                login: login.to_string(),
            });
        }

        info!(login = %login, "Password updated");
        Ok(())
    }

    pub fn exists(
        &self,
        login: &str,
    ) -> AccountResult<bool> {
        let login = login.trim();
        let conn = self.connection()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM accounts WHERE login = ?1",
                params![login],
                |_| Ok(()),
            )
            .optional()
            .map_err(storage_error)?
            .is_some();

        debug!(login = %login, found, "Account lookup");
        Ok(found)
    }

    pub fn count(&self) -> AccountResult<u64> {
        let conn = self.connection()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))
            .map_err(storage_error)?;
        Ok(count.max(0) as u64)
    }

    /// Все учётные записи по возрастанию времени создания.
    pub fn list_all(&self) -> AccountResult<Vec<AccountRecord>> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare("SELECT login, display_name, created_at FROM accounts ORDER BY created_at, id")
            .map_err(storage_error)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(storage_error)?;

        let mut records = Vec::new();
        for row in rows {
            let (login, display_name, created_at) = row.map_err(storage_error)?;
            records.push(AccountRecord {
                login,
                display_name,
                created_at: parse_timestamp(&created_at)?,
            });
        }

        debug!(count = records.len(), "Accounts listed");
        Ok(records)
    }

    /// Открывает соединение на время одной операции.
    fn connection(&self) -> AccountResult<Connection> {
        self.factory.connect().map_err(|e| {
            error!(store = %self.factory.describe(), error = %e, "Failed to open account database");
            AccountError::storage(e)
        })
    }
}

fn storage_error(err: rusqlite::Error) -> AccountError {
    error!(error = %err, "Account database operation failed");
    AccountError::storage(err)
}

fn parse_timestamp(raw: &str) -> AccountResult<DateTime<Utc>> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AccountError::storage(format!("malformed created_at value '{raw}'")))
}
