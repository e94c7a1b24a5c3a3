//! Domain layer - Core entities and value objects.
//!
//! Pure domain logic with no infrastructure dependencies. The credential
//! record lives here as the [`Password`] value object; accounts carry the
//! two-valued role tag used by the catalog backend.

pub mod account;
pub mod constants;
pub mod error;
pub mod password;

pub use account::{Account, AccountRole};
pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use password::Password;
