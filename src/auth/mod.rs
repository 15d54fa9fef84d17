//! Access tokens and permission predicates.

pub mod jwt;
pub mod permissions;

pub use jwt::{mint_access_token, verify_access_token, Claims};
pub use permissions::*;
