/// Typed accounts, password digests and the in-memory access control layer.
pub mod auth;
/// Settings loading (defaults, TOML file, `CREDKEEP_*` environment).
pub mod config;
/// Structured logging (filters, console and file sinks).
pub mod logging;
/// Persistent SQLite credential store.
pub mod storage;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Account model and in-memory access control.
pub use auth::{
    hash_password, verify_password, AccessControl, AccessPolicy, Account, AccountKind,
    AccountView, GuestSession, KindDetail, KindName, PasswordHash, Permissions,
};
/// Settings.
pub use config::{Settings, SettingsError};
/// Error types shared by both surfaces.
pub use credkeep_error::{AccountError, AccountResult, ErrorExt, StatusCode};
/// Logging bootstrap.
pub use logging::{
    init_logging, FileSinkConfig, LogFormat, LoggingConfig, LoggingError, LoggingHandle,
};
/// Persistent store.
pub use storage::{AccountRecord, ConnectionFactory, CredentialStore, SqliteFile};
