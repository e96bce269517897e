use std::path::{Path, PathBuf};

use rusqlite::Connection;

/// Фабрика соединений с хранилищем.
///
/// Хранилище не держит долгоживущее соединение: каждая операция открывает
/// своё и закрывает его при выходе из области видимости.
pub trait ConnectionFactory {
    fn connect(&self) -> rusqlite::Result<Connection>;

    /// Человекочитаемое имя экземпляра хранилища для логов.
    fn describe(&self) -> String;
}

/// Соединения с SQLite-файлом по пути.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteFile {
    path: PathBuf,
}

impl SqliteFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Файл существует и не пуст.
    pub fn is_initialized(&self) -> bool {
        std::fs::metadata(&self.path)
            .map(|m| m.len() > 0)
            .unwrap_or(false)
    }
}

impl ConnectionFactory for SqliteFile {
    fn connect(&self) -> rusqlite::Result<Connection> {
        Connection::open(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
