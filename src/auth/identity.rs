use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

/// Proof of identity handed over by an external provider during login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginAssertion {
    pub server_name: String,
    pub token: String,
}

/// Turns a login assertion into a verified user id.
///
/// Implementations talk to the provider that issued the assertion and return
/// `Error::Unauthenticated` when it is rejected. The token codec never looks
/// at the assertion itself.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve_user(&self, assertion: &LoginAssertion) -> Result<String>;
}
