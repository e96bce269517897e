use std::{fmt, time::Duration};

use chrono::{DateTime, Utc};
use credkeep_error::{AccountError, AccountResult};
use indexmap::IndexSet;
use serde::Serialize;
use tokio::time::Instant;

use super::password::PasswordHash;

/// Длительность гостевой сессии по умолчанию (1ч).
pub const GUEST_SESSION_DURATION: Duration = Duration::from_secs(3600);

/// Логин и пароль гостя по умолчанию.
pub const GUEST_LOGIN: &str = "guest";
pub const GUEST_PASSWORD: &str = "guest";

/// Уровень доступа гостя.
pub const GUEST_ACCESS_LEVEL: &str = "read_only";

/// Права администратора по умолчанию.
pub const DEFAULT_ADMIN_PERMISSIONS: [&str; 4] = [
    "user_management",
    "system_config",
    "database_access",
    "security_settings",
];

/// Формат времени последнего входа в сводках.
pub const LAST_LOGIN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Обрезает пробелы и проверяет, что значение не пустое.
pub fn require_field<'a>(
    value: &'a str,
    field: &'static str,
) -> AccountResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AccountError::validation(field));
    }
    Ok(trimmed)
}

/// Проверяет пароль: пустой пароль недопустим, пробелы значимы.
pub fn require_password(password: &str) -> AccountResult<&str> {
    if password.trim().is_empty() {
        return Err(AccountError::validation("password"));
    }
    Ok(password)
}

/// Вид учётной записи без полезной нагрузки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum KindName {
    Administrator,
    Regular,
    Guest,
}

/// Набор прав администратора: семантика множества, порядок выдачи
/// сохраняется.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Permissions(IndexSet<String>);

/// Гостевая сессия: окно действия отсчитывается от момента создания.
#[derive(Debug, Clone)]
pub struct GuestSession {
    started_at: Instant,
    duration: Duration,
}

/// Данные, специфичные для вида учётной записи.
#[derive(Debug, Clone)]
pub enum AccountKind {
    Administrator {
        permissions: Permissions,
    },
    Regular {
        last_login: Option<DateTime<Utc>>,
        login_count: u64,
    },
    Guest(GuestSession),
}

/// Учётная запись in-memory слоя контроля доступа.
#[derive(Debug, Clone)]
pub struct Account {
    login: String,
    password_hash: PasswordHash,
    display_name: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    kind: AccountKind,
}

/// Детали вида учётной записи в read-view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum KindDetail {
    Administrator {
        permissions: Vec<String>,
    },
    Regular {
        last_login: Option<DateTime<Utc>>,
        login_count: u64,
    },
    Guest {
        remaining_secs: u64,
        access_level: &'static str,
    },
}

/// Снимок учётной записи только для чтения.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    pub login: String,
    pub display_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub detail: KindDetail,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl KindName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Administrator => "Administrator",
            Self::Regular => "Regular",
            Self::Guest => "Guest",
        }
    }
}

impl Permissions {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Набор прав администратора по умолчанию.
    pub fn defaults() -> Self {
        Self::new(DEFAULT_ADMIN_PERMISSIONS)
    }

    pub fn has_permission(
        &self,
        name: &str,
    ) -> bool {
        self.0.contains(name)
    }

    /// Добавляет право. Возвращает `false`, если оно уже было.
    pub fn add_permission(
        &mut self,
        name: impl Into<String>,
    ) -> bool {
        self.0.insert(name.into())
    }

    /// Удаляет право. Возвращает `false`, если его не было.
    pub fn remove_permission(
        &mut self,
        name: &str,
    ) -> bool {
        self.0.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl GuestSession {
    pub fn new(duration: Duration) -> Self {
        Self {
            started_at: Instant::now(),
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Сессия истекла, когда прошло строго больше `duration`.
    pub fn is_expired(&self) -> bool {
        self.elapsed() > self.duration
    }

    /// Оставшееся время сессии, никогда не отрицательное.
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed())
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining().as_secs()
    }
}

impl Account {
    fn build(
        login: &str,
        password: &str,
        kind: AccountKind,
    ) -> AccountResult<Self> {
        let login = require_field(login, "login")?;
        let password = require_password(password)?;
        Ok(Self {
            login: login.to_string(),
            password_hash: PasswordHash::compute(password),
            display_name: login.to_string(),
            is_active: true,
            created_at: Utc::now(),
            kind,
        })
    }

    /// Администратор с заданным набором прав.
    pub fn administrator(
        login: &str,
        password: &str,
        permissions: Permissions,
    ) -> AccountResult<Self> {
        Self::build(login, password, AccountKind::Administrator { permissions })
    }

    pub fn regular(
        login: &str,
        password: &str,
    ) -> AccountResult<Self> {
        Self::build(
            login,
            password,
            AccountKind::Regular {
                last_login: None,
                login_count: 0,
            },
        )
    }

    /// Гость с окном сессии `duration`, отсчитываемым с этого момента.
    pub fn guest(
        login: &str,
        password: &str,
        duration: Duration,
    ) -> AccountResult<Self> {
        Self::build(login, password, AccountKind::Guest(GuestSession::new(duration)))
    }

    /// Гость с учётными данными и длительностью по умолчанию.
    pub fn default_guest() -> Self {
        Self {
            login: GUEST_LOGIN.to_string(),
            password_hash: PasswordHash::compute(GUEST_PASSWORD),
            display_name: GUEST_LOGIN.to_string(),
            is_active: true,
            created_at: Utc::now(),
            kind: AccountKind::Guest(GuestSession::new(GUEST_SESSION_DURATION)),
        }
    }

    pub fn with_display_name(
        mut self,
        display_name: &str,
    ) -> AccountResult<Self> {
        self.display_name = require_field(display_name, "display_name")?.to_string();
        Ok(self)
    }

    pub fn with_active(
        mut self,
        is_active: bool,
    ) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn kind(&self) -> &AccountKind {
        &self.kind
    }

    pub fn kind_name(&self) -> KindName {
        match self.kind {
            AccountKind::Administrator { .. } => KindName::Administrator,
            AccountKind::Regular { .. } => KindName::Regular,
            AccountKind::Guest(_) => KindName::Guest,
        }
    }

    pub fn verify_password(
        &self,
        password: &str,
    ) -> bool {
        self.password_hash.matches(password)
    }

    pub(crate) fn set_active(
        &mut self,
        is_active: bool,
    ) {
        self.is_active = is_active;
    }

    /// Гостевая сессия, если это гость.
    pub fn guest_session(&self) -> Option<&GuestSession> {
        match &self.kind {
            AccountKind::Guest(session) => Some(session),
            _ => None,
        }
    }

    pub fn permissions(&self) -> Option<&Permissions> {
        match &self.kind {
            AccountKind::Administrator { permissions } => Some(permissions),
            _ => None,
        }
    }

    pub fn permissions_mut(&mut self) -> Option<&mut Permissions> {
        match &mut self.kind {
            AccountKind::Administrator { permissions } => Some(permissions),
            _ => None,
        }
    }

    /// Шаг после успешной аутентификации, зависящий от вида учётной записи.
    pub(crate) fn on_authenticated(&mut self) {
        match &mut self.kind {
            AccountKind::Regular {
                last_login,
                login_count,
            } => {
                let now = Utc::now();
                // last_login не откатывается назад при скачке системных часов
                *last_login = Some(match *last_login {
                    Some(prev) if prev > now => prev,
                    _ => now,
                });
                *login_count += 1;
            }
            AccountKind::Administrator { .. } | AccountKind::Guest(_) => {}
        }
    }

    pub fn view(&self) -> AccountView {
        let detail = match &self.kind {
            AccountKind::Administrator { permissions } => KindDetail::Administrator {
                permissions: permissions.iter().map(str::to_string).collect(),
            },
            AccountKind::Regular {
                last_login,
                login_count,
            } => KindDetail::Regular {
                last_login: *last_login,
                login_count: *login_count,
            },
            AccountKind::Guest(session) => KindDetail::Guest {
                remaining_secs: session.remaining_secs(),
                access_level: GUEST_ACCESS_LEVEL,
            },
        };

        AccountView {
            login: self.login.clone(),
            display_name: self.display_name.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
            detail,
        }
    }
}

impl AccountView {
    pub fn kind_name(&self) -> KindName {
        match self.detail {
            KindDetail::Administrator { .. } => KindName::Administrator,
            KindDetail::Regular { .. } => KindName::Regular,
            KindDetail::Guest { .. } => KindName::Guest,
        }
    }

    pub fn status(&self) -> &'static str {
        if self.is_active {
            "Active"
        } else {
            "Inactive"
        }
    }

    /// Строка с деталями вида: права, последний вход или остаток сессии.
    pub fn detail_line(&self) -> String {
        match &self.detail {
            KindDetail::Administrator { permissions } => {
                format!("Permissions: {}", permissions.join(", "))
            }
            KindDetail::Regular {
                last_login,
                login_count,
            } => {
                let last = last_login
                    .map(|t| t.format(LAST_LOGIN_FORMAT).to_string())
                    .unwrap_or_else(|| "Never".to_string());
                format!("Last login: {last}, Login count: {login_count}")
            }
            KindDetail::Guest { remaining_secs, .. } => {
                format!("Session remaining: {remaining_secs} seconds")
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for KindName {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Account {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let status = if self.is_active { "Active" } else { "Inactive" };
        write!(f, "{}: {} ({status})", self.kind_name(), self.login)
    }
}

impl fmt::Display for AccountView {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "{}: {} ({})",
            self.kind_name(),
            self.login,
            self.status()
        )
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
