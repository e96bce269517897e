use std::time::Duration;

use credkeep_error::AccountResult;

use super::account::{
    Account, Permissions, DEFAULT_ADMIN_PERMISSIONS, GUEST_LOGIN, GUEST_PASSWORD,
    GUEST_SESSION_DURATION,
};

/// Параметры создания учётных записей по умолчанию.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    /// Длительность гостевой сессии.
    pub guest_session: Duration,
    /// Права администратора, если явные права не переданы.
    pub admin_permissions: Vec<String>,
}

impl AccessPolicy {
    /// Администратор с правами из политики.
    pub fn administrator(
        &self,
        login: &str,
        password: &str,
    ) -> AccountResult<Account> {
        Account::administrator(
            login,
            password,
            Permissions::new(self.admin_permissions.iter().cloned()),
        )
    }

    /// Гость `guest`/`guest` с длительностью сессии из политики.
    pub fn guest(&self) -> AccountResult<Account> {
        Account::guest(GUEST_LOGIN, GUEST_PASSWORD, self.guest_session)
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            guest_session: GUEST_SESSION_DURATION,
            admin_permissions: DEFAULT_ADMIN_PERMISSIONS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}
