use std::{path::Path, time::Duration};

use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    auth::{AccessPolicy, DEFAULT_ADMIN_PERMISSIONS, GUEST_SESSION_DURATION},
    logging::{FileSinkConfig, LogFormat, LoggingConfig},
};

/// Путь к файлу БД по умолчанию.
pub const DEFAULT_DATABASE_PATH: &str = "users_database.db";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid setting '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Настройки приложения.
///
/// Источники по возрастанию приоритета: значения по умолчанию, TOML-файл
/// (если передан), переменные окружения `CREDKEEP_*`. Это единственное место,
/// где читается окружение `CREDKEEP_*`, включая параметры логирования.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub database_path: String,
    pub guest_session_secs: u64,
    pub default_admin_permissions: Vec<String>,
    pub log_level: String,
    pub log_format: LogFormat,
    /// Каталог для файлового sink-а логов (`CREDKEEP_LOG_DIR`)
    #[serde(default)]
    pub log_dir: Option<String>,
}

impl Settings {
    /// Значения по умолчанию и окружение.
    pub fn load() -> Result<Self, SettingsError> {
        Self::finish(Self::builder()?)
    }

    /// Как [`Settings::load`], но с TOML-файлом между умолчаниями и
    /// окружением.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let builder = Self::builder()?.add_source(
            File::from(path)
                .format(FileFormat::Toml)
                .required(true),
        );
        Self::finish(builder)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.database_path.trim().is_empty() {
            return Err(SettingsError::Invalid {
                key: "database_path",
                reason: "must not be empty".into(),
            });
        }
        if self.guest_session_secs == 0 {
            return Err(SettingsError::Invalid {
                key: "guest_session_secs",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn guest_session(&self) -> Duration {
        Duration::from_secs(self.guest_session_secs)
    }

    /// Политика создания учётных записей для in-memory слоя.
    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy {
            guest_session: self.guest_session(),
            admin_permissions: self.default_admin_permissions.clone(),
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.trim().to_lowercase(),
            format: self.log_format,
            file: self.log_dir.as_deref().map(FileSinkConfig::in_dir),
            ..LoggingConfig::default()
        }
    }

    fn builder() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let permissions: Vec<String> = DEFAULT_ADMIN_PERMISSIONS
            .iter()
            .map(|p| p.to_string())
            .collect();

        Config::builder()
            .set_default("database_path", DEFAULT_DATABASE_PATH)?
            .set_default("guest_session_secs", GUEST_SESSION_DURATION.as_secs() as i64)?
            .set_default("default_admin_permissions", permissions)?
            .set_default("log_level", "info")?
            .set_default("log_format", "compact")
    }

    fn finish(builder: ConfigBuilder<config::builder::DefaultState>) -> Result<Self, SettingsError> {
        let cfg = builder
            // CREDKEEP_DEFAULT_ADMIN_PERMISSIONS=a,b,c
            .add_source(
                Environment::with_prefix("CREDKEEP")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("default_admin_permissions"),
            )
            .build()?;

        let settings: Self = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            guest_session_secs: GUEST_SESSION_DURATION.as_secs(),
            default_admin_permissions: DEFAULT_ADMIN_PERMISSIONS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use serial_test::serial;

    use super::*;

    const VARS: [&str; 6] = [
        "CREDKEEP_DATABASE_PATH",
        "CREDKEEP_GUEST_SESSION_SECS",
        "CREDKEEP_DEFAULT_ADMIN_PERMISSIONS",
        "CREDKEEP_LOG_LEVEL",
        "CREDKEEP_LOG_FORMAT",
        "CREDKEEP_LOG_DIR",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let settings = Settings::load().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.access_policy(), AccessPolicy::default());
    }

    /// Тест проверяет, что окружение перекрывает значения по умолчанию,
    /// включая список прав через запятую.
    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        env::set_var("CREDKEEP_DATABASE_PATH", "/tmp/other.db");
        env::set_var("CREDKEEP_GUEST_SESSION_SECS", "60");
        env::set_var("CREDKEEP_DEFAULT_ADMIN_PERMISSIONS", "full_access,audit");
        env::set_var("CREDKEEP_LOG_FORMAT", "json");

        let settings = Settings::load();
        clear_env();
        let settings = settings.unwrap();

        assert_eq!(settings.database_path, "/tmp/other.db");
        assert_eq!(settings.guest_session(), Duration::from_secs(60));
        assert_eq!(settings.default_admin_permissions, ["full_access", "audit"]);
        assert_eq!(settings.logging_config().format, LogFormat::Json);
    }

    /// Тест проверяет, что параметры логирования из окружения разбираются
    /// без учёта регистра и попадают в `LoggingConfig`.
    #[test]
    #[serial]
    fn test_logging_env_is_case_insensitive() {
        clear_env();
        env::set_var("CREDKEEP_LOG_FORMAT", "JSON");
        env::set_var("CREDKEEP_LOG_LEVEL", "DEBUG");
        env::set_var("CREDKEEP_LOG_DIR", "/tmp/credkeep-logs");

        let settings = Settings::load();
        clear_env();
        let logging = settings.unwrap().logging_config();

        assert_eq!(logging.format, LogFormat::Json);
        assert_eq!(logging.level, "debug");
        assert!(logging.validate().is_ok());
        assert_eq!(
            logging.file.map(|f| f.dir),
            Some(std::path::PathBuf::from("/tmp/credkeep-logs"))
        );
    }

    #[test]
    #[serial]
    fn test_invalid_log_format_rejected() {
        clear_env();
        env::set_var("CREDKEEP_LOG_FORMAT", "xml");
        let result = Settings::load();
        clear_env();
        assert!(matches!(result, Err(SettingsError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_toml_file_then_env() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credkeep.toml");
        std::fs::write(
            &path,
            "database_path = \"from_file.db\"\nguest_session_secs = 120\nlog_level = \"debug\"\n",
        )
        .unwrap();

        env::set_var("CREDKEEP_GUEST_SESSION_SECS", "30");
        let settings = Settings::load_from(&path);
        clear_env();
        let settings = settings.unwrap();

        assert_eq!(settings.database_path, "from_file.db");
        assert_eq!(settings.guest_session_secs, 30);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.default_admin_permissions.len(), 4);
    }

    #[test]
    #[serial]
    fn test_zero_guest_session_rejected() {
        clear_env();
        env::set_var("CREDKEEP_GUEST_SESSION_SECS", "0");
        let result = Settings::load();
        clear_env();
        assert!(matches!(
            result,
            Err(SettingsError::Invalid {
                key: "guest_session_secs",
                ..
            })
        ));
    }

    #[test]
    #[serial]
    fn test_missing_file_is_error() {
        clear_env();
        let result = Settings::load_from("/definitely/not/here.toml");
        assert!(matches!(result, Err(SettingsError::Config(_))));
    }
}
