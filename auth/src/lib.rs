//! # Service Account Authentication
//!
//! Exchanges a Yandex Cloud service account authorized key for short-lived
//! IAM tokens.
//!
//! [`CredentialManager::get_token`] hands out a cached token while it is
//! valid and refreshes it under a mutex otherwise, so concurrent callers
//! trigger at most one token endpoint call per expiry cycle.

pub mod key;
pub mod manager;

pub use key::{KeyAlgorithm, ServiceAccountKey};
pub use manager::{CredentialManager, IAM_TOKEN_URL};
