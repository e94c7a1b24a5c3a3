//! Credential Service
//!
//! Password hashing/verification and signed, time-bounded access tokens.
//! Stateless and CPU-bound: nothing here touches the database.

pub mod clock;
pub mod service;

pub use clock::{Clock, SystemClock};
pub use service::{
    bearer_token, ClaimSet, Claims, CredentialManager, CredentialService, TokenResponse,
};

#[cfg(any(test, feature = "test-utils"))]
pub use clock::MockClock;
