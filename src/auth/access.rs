use std::collections::HashMap;

use credkeep_error::{AccountError, AccountResult};
use tracing::{debug, info, warn};

use super::{
    account::{Account, AccountView, KindName, Permissions},
    policy::AccessPolicy,
};

/// In-memory слой контроля доступа над типизированными учётными записями.
///
/// Учётные записи хранятся в порядке регистрации; удаление не
/// поддерживается, поэтому индекс по логину остаётся стабильным.
#[derive(Debug, Default)]
pub struct AccessControl {
    accounts: Vec<Account>,
    index: HashMap<String, usize>,
    policy: AccessPolicy,
}

impl AccessControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: AccessPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Регистрирует учётную запись. Логин должен быть уникален.
    pub fn register(
        &mut self,
        account: Account,
    ) -> AccountResult<()> {
        if self.index.contains_key(account.login()) {
            warn!(login = %account.login(), "Registration rejected: login already exists");
            return Err(AccountError::DuplicateLogin {
                login: account.login().to_string(),
            });
        }

        info!(
            login = %account.login(),
            kind = %account.kind_name(),
            "Account registered"
        );
        self.index
            .insert(account.login().to_string(), self.accounts.len());
        self.accounts.push(account);
        Ok(())
    }

    /// Регистрирует администратора с правами из политики.
    pub fn register_administrator(
        &mut self,
        login: &str,
        password: &str,
    ) -> AccountResult<()> {
        let account = self.policy.administrator(login, password)?;
        self.register(account)
    }

    /// Регистрирует гостя `guest`/`guest` с длительностью сессии из политики.
    pub fn register_default_guest(&mut self) -> AccountResult<()> {
        let account = self.policy.guest()?;
        self.register(account)
    }

    /// Аутентификация по логину и паролю.
    ///
    /// Порядок проверок: существование, активность, истечение гостевой
    /// сессии, пароль. Истёкший гость отклоняется даже с верным паролем.
    pub fn authenticate(
        &mut self,
        login: &str,
        password: &str,
    ) -> AccountResult<AccountView> {
        let login = login.trim();
        let account = self.find_mut(login)?;

        if !account.is_active() {
            warn!(login = %login, "Authentication failed: account is inactive");
            return Err(AccountError::InactiveAccount {
                login: login.to_string(),
            });
        }

        if account.guest_session().is_some_and(|s| s.is_expired()) {
            warn!(login = %login, "Authentication failed: guest session expired");
            return Err(AccountError::SessionExpired {
                login: login.to_string(),
            });
        }

        if !account.verify_password(password) {
            warn!(login = %login, "Authentication failed: invalid password");
            return Err(AccountError::InvalidCredentials {
                login: login.to_string(),
            });
        }

        account.on_authenticated();
        info!(login = %login, kind = %account.kind_name(), "Authentication successful");
        Ok(account.view())
    }

    pub fn deactivate(
        &mut self,
        login: &str,
    ) -> AccountResult<()> {
        self.set_active(login, false)
    }

    pub fn activate(
        &mut self,
        login: &str,
    ) -> AccountResult<()> {
        self.set_active(login, true)
    }

    /// Сводки всех учётных записей в порядке регистрации.
    pub fn list_all(&self) -> Vec<AccountView> {
        self.accounts.iter().map(Account::view).collect()
    }

    pub fn get(
        &self,
        login: &str,
    ) -> Option<AccountView> {
        self.index
            .get(login.trim())
            .map(|&i| self.accounts[i].view())
    }

    pub fn contains(
        &self,
        login: &str,
    ) -> bool {
        self.index.contains_key(login.trim())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Изменяемый доступ к правам администратора.
    pub fn permissions_mut(
        &mut self,
        login: &str,
    ) -> AccountResult<&mut Permissions> {
        let login = login.trim();
        let account = self.find_mut(login)?;
        account
            .permissions_mut()
            .ok_or_else(|| AccountError::KindMismatch {
                login: login.to_string(),
                expected: KindName::Administrator.as_str(),
            })
    }

    pub fn has_permission(
        &self,
        login: &str,
        permission: &str,
    ) -> AccountResult<bool> {
        let login = login.trim();
        let account = self.find(login)?;
        account
            .permissions()
            .map(|p| p.has_permission(permission))
            .ok_or_else(|| AccountError::KindMismatch {
                login: login.to_string(),
                expected: KindName::Administrator.as_str(),
            })
    }

    /// Выдаёт право администратору. Повторная выдача ничего не меняет.
    pub fn grant_permission(
        &mut self,
        login: &str,
        permission: &str,
    ) -> AccountResult<()> {
        if self.permissions_mut(login)?.add_permission(permission) {
            info!(login = %login.trim(), permission, "Permission granted");
        }
        Ok(())
    }

    /// Отзывает право администратора. Отсутствующее право игнорируется.
    pub fn revoke_permission(
        &mut self,
        login: &str,
        permission: &str,
    ) -> AccountResult<()> {
        if self.permissions_mut(login)?.remove_permission(permission) {
            info!(login = %login.trim(), permission, "Permission revoked");
        }
        Ok(())
    }

    fn set_active(
        &mut self,
        login: &str,
        is_active: bool,
    ) -> AccountResult<()> {
        let login = login.trim();
        let account = self.find_mut(login)?;
        account.set_active(is_active);
        info!(login = %login, is_active, "Account activation changed");
        Ok(())
    }

    fn find(
        &self,
        login: &str,
    ) -> AccountResult<&Account> {
        match self.index.get(login) {
            Some(&i) => Ok(&self.accounts[i]),
            None => {
                debug!(login = %login, "Account not found");
                Err(AccountError::NotFound {
                    login: login.to_string(),
                })
            }
        }
    }

    fn find_mut(
        &mut self,
        login: &str,
    ) -> AccountResult<&mut Account> {
        match self.index.get(login) {
            Some(&i) => Ok(&mut self.accounts[i]),
            None => {
                debug!(login = %login, "Account not found");
                Err(AccountError::NotFound {
                    login: login.to_string(),
                })
            }
        }
    }
}
