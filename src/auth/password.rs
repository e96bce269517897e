use std::fmt;

use sha2::{Digest, Sha256};

/// Длина hex-представления SHA-256 дайджеста.
pub const DIGEST_HEX_LEN: usize = 64;

/// Хеш пароля: SHA-256 от UTF-8 байтов, lowercase hex.
///
/// `Debug` не печатает значение, чтобы хеш не утекал в логи вместе со
/// структурами учётных записей.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Вычисляет хеш пароля.
    pub fn compute(password: &str) -> Self {
        Self(hash_password(password))
    }

    /// Оборачивает уже сохранённый дайджест (например, прочитанный из БД).
    pub fn from_stored(digest: String) -> Self {
        Self(digest)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Сравнивает хеш пароля с сохранённым за постоянное время.
    pub fn matches(
        &self,
        password: &str,
    ) -> bool {
        verify_password(&self.0, password)
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub fn verify_password(
    hash: &str,
    password: &str,
) -> bool {
    constant_time_eq(hash.as_bytes(), hash_password(password).as_bytes())
}

fn constant_time_eq(
    a: &[u8],
    b: &[u8],
) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
