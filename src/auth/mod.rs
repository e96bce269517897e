pub mod access;
pub mod account;
pub mod password;
pub mod policy;

pub use access::*;
pub use account::*;
pub use password::*;
pub use policy::*;
