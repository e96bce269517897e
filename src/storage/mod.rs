pub mod connector;
pub mod credential_store;

pub use connector::{ConnectionFactory, SqliteFile};
pub use credential_store::{AccountRecord, CredentialStore};
