pub mod account;

// Публичный экспорт типов ошибок из вложенных модулей.
pub use account::*;
