use std::{fs, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

use super::LoggingError;

/// Допустимые уровни логирования.
const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Формат вывода событий. Разбор имени нечувствителен к регистру.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Настройки файлового sink-а (ежедневная ротация).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FileSinkConfig {
    /// Каталог для файлов логов
    pub dir: PathBuf,
    /// Префикс имени файла
    #[serde(default = "default_file_prefix")]
    pub prefix: String,
}

/// Конфигурация логирования.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Базовый уровень для крейта credkeep
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_true")]
    pub with_ansi: bool,
    #[serde(default)]
    pub with_target: bool,
    /// Файловый sink, если задан
    #[serde(default)]
    pub file: Option<FileSinkConfig>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), LoggingError> {
        if !LEVELS.contains(&self.level.as_str()) {
            return Err(LoggingError::InvalidLevel(self.level.clone()));
        }
        if let Some(file) = &self.file {
            if file.prefix.trim().is_empty() {
                return Err(LoggingError::InvalidFilePrefix);
            }
        }
        Ok(())
    }

    /// Создаёт каталог для файлового sink-а, если он включён.
    pub fn ensure_log_dir(&self) -> Result<(), LoggingError> {
        if let Some(file) = &self.file {
            fs::create_dir_all(&file.dir)?;
        }
        Ok(())
    }

    /// Директива `EnvFilter`: уровень для credkeep, `warn` для остальных.
    pub fn build_filter_directive(&self) -> String {
        format!("warn,credkeep={level},credkeep_error={level}", level = self.level)
    }
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(LoggingError::InvalidFormat(other.to_string())),
        }
    }
}

impl TryFrom<String> for LogFormat {
    type Error = LoggingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FileSinkConfig {
    /// Sink в каталоге `dir` с префиксом файла по умолчанию.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: default_file_prefix(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            with_ansi: true,
            with_target: false,
            file: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_file_prefix() -> String {
    "credkeep.log".to_string()
}

fn default_true() -> bool {
    true
}
