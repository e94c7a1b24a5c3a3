//! Credential service implementation.

mod credential_service;

pub use credential_service::{
    bearer_token, ClaimSet, Claims, CredentialManager, CredentialService, TokenResponse,
};
